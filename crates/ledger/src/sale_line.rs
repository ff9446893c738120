use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tally_core::{DomainResult, EventId, Money, OwnerId, SaleLineId, SkuId, ValidationErrors};

use crate::patch::{double_option, merge};

/// Bundle membership of a sale line.
///
/// Lines sold together share `bundle_id`; `price` is the combined price the
/// customer paid for the whole bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub bundle_id: String,
    pub size: u32,
    pub price: Money,
}

/// One recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: SaleLineId,
    pub owner: OwnerId,
    pub event_id: EventId,
    pub sku_id: SkuId,
    pub sale_date: NaiveDate,
    pub units: u32,
    pub price_unit: Money,
    pub cost_unit: Money,
    pub is_bundle: bool,
    /// Present only when `is_bundle` is set.
    pub bundle: Option<Bundle>,
    pub is_gift: bool,
    pub notes: Option<String>,
}

/// Input: record a sale.
///
/// Bundle fields arrive flat; they must be all present or all absent, and may
/// only be present on bundle lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSaleLine {
    pub event_id: EventId,
    pub sku_id: SkuId,
    pub sale_date: NaiveDate,
    pub units: i64,
    pub price_unit: Money,
    pub cost_unit: Money,
    #[serde(default)]
    pub is_bundle: bool,
    #[serde(default)]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub bundle_size: Option<i64>,
    #[serde(default)]
    pub bundle_price: Option<Money>,
    #[serde(default)]
    pub is_gift: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewSaleLine {
    pub fn validate(&self) -> DomainResult<()> {
        self.checked_bundle().map(|_| ())
    }

    fn checked_bundle(&self) -> DomainResult<Option<Bundle>> {
        let mut errors = ValidationErrors::new();

        if self.units < 1 {
            errors.push("units", "must be at least 1");
        } else if u32::try_from(self.units).is_err() {
            errors.push("units", "is too large");
        }
        if let Some(problem) = self.price_unit.input_problem() {
            errors.push("price_unit", problem);
        }
        if let Some(problem) = self.cost_unit.input_problem() {
            errors.push("cost_unit", problem);
        }

        let present = [
            self.bundle_id.is_some(),
            self.bundle_size.is_some(),
            self.bundle_price.is_some(),
        ];
        let any = present.iter().any(|p| *p);
        let all = present.iter().all(|p| *p);

        if any && !self.is_bundle {
            errors.push("is_bundle", "must be true when bundle fields are set");
        }
        if any && !all {
            if self.bundle_id.is_none() {
                errors.push("bundle_id", "required with the other bundle fields");
            }
            if self.bundle_size.is_none() {
                errors.push("bundle_size", "required with the other bundle fields");
            }
            if self.bundle_price.is_none() {
                errors.push("bundle_price", "required with the other bundle fields");
            }
        }
        if let Some(id) = &self.bundle_id {
            if id.trim().is_empty() {
                errors.push("bundle_id", "must not be blank");
            }
        }
        if let Some(size) = self.bundle_size {
            if size < 1 || u32::try_from(size).is_err() {
                errors.push("bundle_size", "must be at least 1");
            }
        }
        if let Some(problem) = self.bundle_price.and_then(|p| p.input_problem()) {
            errors.push("bundle_price", problem);
        }

        errors.into_result()?;

        Ok(match (&self.bundle_id, self.bundle_size, self.bundle_price) {
            (Some(bundle_id), Some(size), Some(price)) => Some(Bundle {
                bundle_id: bundle_id.trim().to_string(),
                size: size as u32,
                price,
            }),
            _ => None,
        })
    }

    pub fn into_sale_line(self, id: SaleLineId, owner: OwnerId) -> DomainResult<SaleLine> {
        let bundle = self.checked_bundle()?;
        let notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(SaleLine {
            id,
            owner,
            event_id: self.event_id,
            sku_id: self.sku_id,
            sale_date: self.sale_date,
            units: self.units as u32,
            price_unit: self.price_unit,
            cost_unit: self.cost_unit,
            is_bundle: self.is_bundle,
            bundle,
            is_gift: self.is_gift,
            notes,
        })
    }
}

/// Input: partial update of a sale line. `null` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLinePatch {
    #[serde(default)]
    pub event_id: Option<EventId>,
    #[serde(default)]
    pub sku_id: Option<SkuId>,
    #[serde(default)]
    pub sale_date: Option<NaiveDate>,
    #[serde(default)]
    pub units: Option<i64>,
    #[serde(default)]
    pub price_unit: Option<Money>,
    #[serde(default)]
    pub cost_unit: Option<Money>,
    #[serde(default)]
    pub is_bundle: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub bundle_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bundle_size: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bundle_price: Option<Option<Money>>,
    #[serde(default)]
    pub is_gift: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl SaleLine {
    /// Flat input form of this line (inverse of `NewSaleLine::into_sale_line`).
    pub fn to_input(&self) -> NewSaleLine {
        NewSaleLine {
            event_id: self.event_id,
            sku_id: self.sku_id,
            sale_date: self.sale_date,
            units: i64::from(self.units),
            price_unit: self.price_unit,
            cost_unit: self.cost_unit,
            is_bundle: self.is_bundle,
            bundle_id: self.bundle.as_ref().map(|b| b.bundle_id.clone()),
            bundle_size: self.bundle.as_ref().map(|b| i64::from(b.size)),
            bundle_price: self.bundle.as_ref().map(|b| b.price),
            is_gift: self.is_gift,
            notes: self.notes.clone(),
        }
    }

    /// Re-checks a stored line against the create-time rules, including that
    /// bundle metadata only appears on bundle lines.
    pub fn validate(&self) -> DomainResult<()> {
        self.to_input().validate()
    }

    /// The line with `patch` merged in, re-validated as a whole.
    ///
    /// Turning `is_bundle` off without clearing the bundle fields is rejected.
    pub fn patched(&self, patch: &SaleLinePatch) -> DomainResult<SaleLine> {
        let current = self.to_input();
        let merged = NewSaleLine {
            event_id: merge(&patch.event_id, &current.event_id),
            sku_id: merge(&patch.sku_id, &current.sku_id),
            sale_date: merge(&patch.sale_date, &current.sale_date),
            units: merge(&patch.units, &current.units),
            price_unit: merge(&patch.price_unit, &current.price_unit),
            cost_unit: merge(&patch.cost_unit, &current.cost_unit),
            is_bundle: merge(&patch.is_bundle, &current.is_bundle),
            bundle_id: merge(&patch.bundle_id, &current.bundle_id),
            bundle_size: merge(&patch.bundle_size, &current.bundle_size),
            bundle_price: merge(&patch.bundle_price, &current.bundle_price),
            is_gift: merge(&patch.is_gift, &current.is_gift),
            notes: merge(&patch.notes, &current.notes),
        };
        merged.into_sale_line(self.id, self.owner.clone())
    }
}
