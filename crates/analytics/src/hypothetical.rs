//! What-if re-pricing.
//!
//! Rules are evaluated in order against every row and each applicable rule
//! overwrites the working price, so the last applicable rule decides. Stored
//! sale lines are never modified.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use tally_core::{DomainResult, Money, SkuId, ValidationErrors};
use tally_ledger::{ItemType, SaleLineRecord};

use crate::ranking::{SkuBucket, SkuBuckets};
use crate::valuation::Figures;

/// Predicates a rule requires. Absent predicates always hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bundle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skus: Option<HashSet<SkuId>>,
}

impl RuleMatch {
    pub fn matches(&self, record: &SaleLineRecord) -> bool {
        self.is_bundle.is_none_or(|b| record.line.is_bundle == b)
            && self.item_type.is_none_or(|t| record.sku.item_type == t)
            && self.skus.as_ref().is_none_or(|ids| ids.contains(&record.sku.id))
    }
}

/// Override `price_unit` for every row the matcher accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRule {
    #[serde(rename = "match", default)]
    pub matcher: RuleMatch,
    pub price_unit: Money,
}

impl PricingRule {
    pub fn new(matcher: RuleMatch, price_unit: Money) -> Self {
        Self { matcher, price_unit }
    }
}

/// Rejects override prices that are not whole cents or exceed the money cap.
pub fn validate_rules(rules: &[PricingRule]) -> DomainResult<()> {
    let mut errors = ValidationErrors::new();
    for (i, rule) in rules.iter().enumerate() {
        if let Some(problem) = rule.price_unit.input_problem() {
            errors.push("rules", format!("rule {i}: price_unit {problem}"));
        }
    }
    errors.into_result()
}

/// Price a row sells at under `rules`.
pub fn resolve_price(record: &SaleLineRecord, rules: &[PricingRule]) -> Money {
    rules
        .iter()
        .filter(|r| r.matcher.matches(record))
        .last()
        .map_or(record.line.price_unit, |r| r.price_unit)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HypotheticalReport {
    pub total: Figures,
    /// First-seen SKU order.
    pub by_sku: Vec<SkuBucket>,
}

/// Re-values every row at its resolved price and totals the result.
pub fn simulate(rows: &[SaleLineRecord], rules: &[PricingRule]) -> HypotheticalReport {
    let mut total = Figures::default();
    let mut by_sku = SkuBuckets::new();

    for record in rows {
        let figures = Figures::of_line_at(&record.line, resolve_price(record, rules));
        total += figures;
        by_sku.add(record, figures);
    }

    HypotheticalReport {
        total,
        by_sku: by_sku.into_vec(),
    }
}
