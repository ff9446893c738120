//! Bundle deal calculator: is a combined price worth it?

use serde::{Deserialize, Serialize};

use tally_core::Money;

/// One component of a prospective bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleComponent {
    pub units: u32,
    pub cost_unit: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BundleQuote {
    pub bundle_price: Money,
    pub total_cost: Money,
    pub total_units: u64,
    pub profit: Money,
    /// Zero when the bundle has no units.
    pub profit_per_unit: Money,
}

pub fn quote_bundle(components: &[BundleComponent], bundle_price: Money) -> BundleQuote {
    let total_cost: Money = components.iter().map(|c| c.cost_unit.times(c.units)).sum();
    let total_units: u64 = components.iter().map(|c| u64::from(c.units)).sum();
    let profit = bundle_price - total_cost;

    BundleQuote {
        bundle_price,
        total_cost,
        total_units,
        profit,
        profit_per_unit: profit.per(total_units).unwrap_or(Money::ZERO),
    }
}
