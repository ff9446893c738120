//! Grouped totals.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use tally_core::DomainError;
use tally_ledger::SaleLineRecord;

use crate::buckets::Buckets;
use crate::filter::year_month;
use crate::valuation::Figures;

/// Dimension to group sale lines by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Sku,
    #[default]
    ItemType,
    Event,
    YearMonth,
}

impl FromStr for GroupBy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sku" => Ok(GroupBy::Sku),
            "item_type" | "type" => Ok(GroupBy::ItemType),
            "event" => Ok(GroupBy::Event),
            "ym" | "year_month" => Ok(GroupBy::YearMonth),
            other => Err(DomainError::validation(
                "group",
                format!("'{other}' is not one of: sku, item_type, event, ym"),
            )),
        }
    }
}

/// Totals for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub figures: Figures,
}

fn key_and_label(record: &SaleLineRecord, group_by: GroupBy) -> (String, String) {
    match group_by {
        GroupBy::Sku => (record.sku.id.to_string(), record.sku.name.clone()),
        GroupBy::ItemType => {
            let t = record.sku.item_type.as_str().to_string();
            (t.clone(), t)
        }
        GroupBy::Event => (record.event.id.to_string(), record.event.name.clone()),
        GroupBy::YearMonth => {
            let ym = year_month(record.line.sale_date);
            (ym.clone(), ym)
        }
    }
}

/// Sums units, revenue, cogs and gross profit per group.
///
/// Groups come back sorted by label; groups sharing a label keep first-seen
/// order. An empty row set yields no groups.
pub fn summarize(rows: &[SaleLineRecord], group_by: GroupBy) -> Vec<GroupSummary> {
    let mut buckets = Buckets::new();

    for record in rows {
        let (key, label) = key_and_label(record, group_by);
        let bucket = buckets.entry(key.clone(), || GroupSummary {
            key,
            label,
            figures: Figures::default(),
        });
        bucket.figures += Figures::of_line(&record.line);
    }

    let mut groups = buckets.into_vec();
    groups.sort_by(|a, b| a.label.cmp(&b.label));
    groups
}
