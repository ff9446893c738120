use std::collections::BTreeMap;

use serde::Serialize;

use tally_core::Money;
use tally_ledger::{ItemType, Sku};

/// Average default cost of the SKUs of one item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCostAverage {
    pub item_type: ItemType,
    pub average_cost: Money,
    /// SKUs that contributed (those with a positive default cost).
    pub costed_skus: usize,
}

/// Mean `default_cost` per item type present in `skus`.
///
/// SKUs without a positive cost are left out of the mean; a type with no
/// costed SKU averages zero. Types come back in declaration order.
pub fn average_cost_by_type(skus: &[Sku]) -> Vec<TypeCostAverage> {
    let mut sums: BTreeMap<ItemType, (Money, usize)> = BTreeMap::new();

    for sku in skus {
        let entry = sums.entry(sku.item_type).or_insert((Money::ZERO, 0));
        if sku.default_cost > Money::ZERO {
            entry.0 += sku.default_cost;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(item_type, (sum, count))| TypeCostAverage {
            item_type,
            average_cost: sum.per(count as u64).unwrap_or(Money::ZERO),
            costed_skus: count,
        })
        .collect()
}
