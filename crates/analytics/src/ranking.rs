//! Top/bottom SKUs by a metric.

use serde::Serialize;

use tally_core::{DomainError, DomainResult, SkuId};
use tally_ledger::{ItemType, SaleLineRecord};

use crate::buckets::Buckets;
use crate::valuation::{Figures, Metric};

/// Per-SKU totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkuBucket {
    pub sku_id: SkuId,
    pub sku_name: String,
    pub item_type: ItemType,
    #[serde(flatten)]
    pub figures: Figures,
}

/// Accumulates per-SKU figures in first-seen order.
pub(crate) struct SkuBuckets(Buckets<SkuId, SkuBucket>);

impl SkuBuckets {
    pub(crate) fn new() -> Self {
        Self(Buckets::new())
    }

    pub(crate) fn add(&mut self, record: &SaleLineRecord, figures: Figures) {
        let bucket = self.0.entry(record.sku.id, || SkuBucket {
            sku_id: record.sku.id,
            sku_name: record.sku.name.clone(),
            item_type: record.sku.item_type,
            figures: Figures::default(),
        });
        bucket.figures += figures;
    }

    pub(crate) fn into_vec(self) -> Vec<SkuBucket> {
        self.0.into_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankReport {
    pub top: Vec<SkuBucket>,
    /// Worst first.
    pub bottom: Vec<SkuBucket>,
}

/// Ranks SKUs by `metric`, highest first.
///
/// `top` holds the first `limit` SKUs and `bottom` the last `limit` reversed.
/// With `limit` or fewer SKUs both lists hold every SKU. Equal metrics keep
/// first-seen order.
pub fn rank(rows: &[SaleLineRecord], metric: Metric, limit: usize) -> DomainResult<RankReport> {
    if limit == 0 {
        return Err(DomainError::validation("limit", "must be at least 1"));
    }

    let mut buckets = SkuBuckets::new();
    for record in rows {
        buckets.add(record, Figures::of_line(&record.line));
    }

    let mut ranked = buckets.into_vec();
    ranked.sort_by(|a, b| b.figures.get(metric).cmp(&a.figures.get(metric)));

    let top = ranked.iter().take(limit).cloned().collect();
    let bottom = ranked
        .iter()
        .skip(ranked.len().saturating_sub(limit))
        .rev()
        .cloned()
        .collect();

    Ok(RankReport { top, bottom })
}
