//! Row-set builders shared by the unit tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use tally_core::{EventId, Money, OwnerId, SaleLineId, SkuId};
use tally_ledger::{Event, ItemType, SaleLine, SaleLineRecord, Sku};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) struct Fixture {
    owner: OwnerId,
    event: Event,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let owner = OwnerId::new("maya").unwrap();
        let event = Event {
            id: EventId::new(),
            owner: owner.clone(),
            name: "Anime North".to_string(),
            start_date: None,
            end_date: None,
        };
        Self { owner, event }
    }

    pub(crate) fn event(&self, name: &str) -> Event {
        Event {
            id: EventId::new(),
            owner: self.owner.clone(),
            name: name.to_string(),
            start_date: None,
            end_date: None,
        }
    }

    pub(crate) fn sku(&self, name: &str, item_type: ItemType) -> Sku {
        Sku {
            id: SkuId::new(),
            owner: self.owner.clone(),
            name: name.to_string(),
            item_type,
            default_price: Money::ZERO,
            default_cost: Money::ZERO,
        }
    }

    pub(crate) fn row(&self, sku: &Sku, units: u32, price: Decimal, cost: Decimal) -> SaleLineRecord {
        self.row_on(sku, &self.event, date(2025, 5, 24), units, price, cost)
    }

    pub(crate) fn row_on(
        &self,
        sku: &Sku,
        event: &Event,
        sale_date: NaiveDate,
        units: u32,
        price: Decimal,
        cost: Decimal,
    ) -> SaleLineRecord {
        let line = SaleLine {
            id: SaleLineId::new(),
            owner: self.owner.clone(),
            event_id: event.id,
            sku_id: sku.id,
            sale_date,
            units,
            price_unit: Money::new(price),
            cost_unit: Money::new(cost),
            is_bundle: false,
            bundle: None,
            is_gift: false,
            notes: None,
        };
        SaleLineRecord::new(line, sku, event)
    }

    pub(crate) fn bundle_row(&self, sku: &Sku, units: u32, price: Decimal, cost: Decimal) -> SaleLineRecord {
        let mut record = self.row(sku, units, price, cost);
        record.line.is_bundle = true;
        record
    }
}
