//! Query filter: narrows sale lines before valuation.
//!
//! Filtering is two-phase. [`SaleFilter::store_filter`] is what a store can
//! evaluate on the sale line itself (event, SKU, date range, bundle flag) and
//! is pushed down; [`SaleFilter::matches`] then re-checks every predicate on
//! the joined record, including the SKU's item type, which the store cannot
//! see. Any pagination added later has to run after the second pass.
//!
//! Malformed parameters degrade to an empty result instead of an error
//! ([`FilterOutcome::Empty`]).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use tally_core::{EventId, SkuId};
use tally_ledger::{ItemType, SaleLine, SaleLineRecord};

/// Raw query parameters as a client sends them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleQueryParams {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub bundle: Option<String>,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Years a filter may name; anything else selects nothing.
const FILTER_YEARS: core::ops::RangeInclusive<i32> = 1..=9999;

impl DateRange {
    /// January 1 to December 31 of `year`.
    pub fn year(year: i32) -> Option<Self> {
        if !FILTER_YEARS.contains(&year) {
            return None;
        }
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    /// First to last calendar day of `month` in `year`.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        if !FILTER_YEARS.contains(&year) {
            return None;
        }
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end: next.pred_opt()?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Predicates a store can evaluate on the sale line alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreFilter {
    pub event: Option<EventId>,
    pub sku: Option<SkuId>,
    pub dates: Option<DateRange>,
    pub is_bundle: Option<bool>,
}

impl StoreFilter {
    pub fn matches(&self, line: &SaleLine) -> bool {
        self.event.is_none_or(|e| line.event_id == e)
            && self.sku.is_none_or(|s| line.sku_id == s)
            && self.dates.is_none_or(|r| r.contains(line.sale_date))
            && self.is_bundle.is_none_or(|b| line.is_bundle == b)
    }
}

/// Full AND-composed filter over joined records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
    store: StoreFilter,
    item_type: Option<ItemType>,
}

/// Result of parsing query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    Apply(SaleFilter),
    /// A parameter was malformed; the query selects nothing.
    Empty { reason: String },
}

impl FilterOutcome {
    fn empty(reason: impl Into<String>) -> Self {
        FilterOutcome::Empty {
            reason: reason.into(),
        }
    }
}

/// Truthy tokens for boolean query flags: `1`, `true`, `yes`, `y` (any case).
pub fn is_truthy(token: &str) -> bool {
    matches!(
        token.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SaleQueryParams {
    pub fn parse(&self) -> FilterOutcome {
        let mut filter = SaleFilter::default();

        if let Some(raw) = present(&self.event) {
            match EventId::parse_lenient(raw) {
                Some(id) => filter.store.event = Some(id),
                None => return FilterOutcome::empty(format!("malformed event id '{raw}'")),
            }
        }

        // `month` only narrows a `year`; on its own it is ignored.
        if let Some(raw_year) = present(&self.year) {
            let Ok(year) = raw_year.parse::<i32>() else {
                return FilterOutcome::empty(format!("malformed year '{raw_year}'"));
            };
            let range = match present(&self.month) {
                None => DateRange::year(year),
                Some(raw_month) => match raw_month.parse::<u32>() {
                    Ok(month) => DateRange::month(year, month),
                    Err(_) => None,
                },
            };
            match range {
                Some(r) => filter.store.dates = Some(r),
                None => return FilterOutcome::empty("year/month out of range"),
            }
        }

        if let Some(raw) = present(&self.sku) {
            match SkuId::parse_lenient(raw) {
                Some(id) => filter.store.sku = Some(id),
                None => return FilterOutcome::empty(format!("malformed sku id '{raw}'")),
            }
        }

        if let Some(raw) = present(&self.item_type) {
            match raw.parse::<ItemType>() {
                Ok(t) => filter.item_type = Some(t),
                Err(_) => return FilterOutcome::empty(format!("unknown item type '{raw}'")),
            }
        }

        if let Some(raw) = present(&self.bundle) {
            filter.store.is_bundle = Some(is_truthy(raw));
        }

        FilterOutcome::Apply(filter)
    }
}

impl SaleFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn event(mut self, id: EventId) -> Self {
        self.store.event = Some(id);
        self
    }

    pub fn sku(mut self, id: SkuId) -> Self {
        self.store.sku = Some(id);
        self
    }

    pub fn dates(mut self, range: DateRange) -> Self {
        self.store.dates = Some(range);
        self
    }

    pub fn bundle(mut self, is_bundle: bool) -> Self {
        self.store.is_bundle = Some(is_bundle);
        self
    }

    pub fn item_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    /// The part of this filter a store can push down.
    pub fn store_filter(&self) -> &StoreFilter {
        &self.store
    }

    /// Row-level check of every predicate against a joined record.
    pub fn matches(&self, record: &SaleLineRecord) -> bool {
        self.store.matches(&record.line) && self.item_type.is_none_or(|t| record.sku.item_type == t)
    }

    /// Second pass over rows already narrowed by [`Self::store_filter`].
    pub fn retain(&self, records: &mut Vec<SaleLineRecord>) {
        records.retain(|r| self.matches(r));
    }
}

/// Default listing order: newest sale first, ties in fetch order.
pub fn sort_newest_first(records: &mut [SaleLineRecord]) {
    records.sort_by(|a, b| b.line.sale_date.cmp(&a.line.sale_date));
}

/// `YYYY-MM` bucket label for a sale date.
pub fn year_month(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}
