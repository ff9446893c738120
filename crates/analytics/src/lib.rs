//! Revenue, cost and profit analytics over sale lines.
//!
//! Everything here is a pure function over an in-memory row set that the
//! caller already fetched:
//!
//! - [`valuation`]: per-line revenue / cogs / gross profit
//! - [`filter`]: query parameters to a two-phase row filter
//! - [`summary`]: grouped totals
//! - [`ranking`]: top/bottom SKUs by a metric
//! - [`hypothetical`]: what-if re-pricing
//! - [`catalog`], [`bundle`]: pricing helpers over SKU defaults

mod buckets;

pub mod bundle;
pub mod catalog;
pub mod filter;
pub mod hypothetical;
pub mod ranking;
pub mod summary;
pub mod valuation;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bundle::{BundleComponent, BundleQuote, quote_bundle};
pub use catalog::{TypeCostAverage, average_cost_by_type};
pub use filter::{
    DateRange, FilterOutcome, SaleFilter, SaleQueryParams, StoreFilter, is_truthy, sort_newest_first,
};
pub use hypothetical::{HypotheticalReport, PricingRule, RuleMatch, resolve_price, simulate, validate_rules};
pub use ranking::{RankReport, SkuBucket, rank};
pub use summary::{GroupBy, GroupSummary, summarize};
pub use valuation::{Figures, Metric, SaleLineView};
