//! Row valuation.
//!
//! `revenue = units × price_unit`, `cogs = units × cost_unit`,
//! `gross_profit = revenue − cogs`, all in exact decimal. Nothing is rounded
//! until a value is serialized.

use core::iter::Sum;
use core::ops::{Add, AddAssign};
use core::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_core::{DomainError, Money, SaleLineId};
use tally_ledger::{EventRef, SaleLine, SaleLineRecord, SkuRef};

/// Units and money figures for one row or a group of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Figures {
    pub units: u64,
    pub revenue: Money,
    pub cogs: Money,
    pub gross_profit: Money,
}

impl Figures {
    pub fn of(units: u32, price_unit: Money, cost_unit: Money) -> Self {
        let revenue = price_unit.times(units);
        let cogs = cost_unit.times(units);
        Self {
            units: u64::from(units),
            revenue,
            cogs,
            gross_profit: revenue - cogs,
        }
    }

    /// Figures of a line at its stored price.
    pub fn of_line(line: &SaleLine) -> Self {
        Self::of(line.units, line.price_unit, line.cost_unit)
    }

    /// Figures of a line re-priced at `price_unit` (units and cost unchanged).
    pub fn of_line_at(line: &SaleLine, price_unit: Money) -> Self {
        Self::of(line.units, price_unit, line.cost_unit)
    }

    pub fn get(&self, metric: Metric) -> Decimal {
        match metric {
            Metric::Units => Decimal::from(self.units),
            Metric::Revenue => self.revenue.amount(),
            Metric::Cogs => self.cogs.amount(),
            Metric::GrossProfit => self.gross_profit.amount(),
        }
    }
}

impl AddAssign for Figures {
    fn add_assign(&mut self, rhs: Figures) {
        self.units += rhs.units;
        self.revenue += rhs.revenue;
        self.cogs += rhs.cogs;
        self.gross_profit += rhs.gross_profit;
    }
}

impl Add for Figures {
    type Output = Figures;

    fn add(mut self, rhs: Figures) -> Figures {
        self += rhs;
        self
    }
}

impl Sum for Figures {
    fn sum<I: Iterator<Item = Figures>>(iter: I) -> Figures {
        iter.fold(Figures::default(), Add::add)
    }
}

/// A figure field that rows can be ranked by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Units,
    Revenue,
    Cogs,
    #[default]
    GrossProfit,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Units => "units",
            Metric::Revenue => "revenue",
            Metric::Cogs => "cogs",
            Metric::GrossProfit => "gross_profit",
        }
    }
}

impl FromStr for Metric {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "units" => Ok(Metric::Units),
            "revenue" => Ok(Metric::Revenue),
            "cogs" => Ok(Metric::Cogs),
            "gross_profit" => Ok(Metric::GrossProfit),
            other => Err(DomainError::validation(
                "metric",
                format!("'{other}' is not one of: units, revenue, cogs, gross_profit"),
            )),
        }
    }
}

/// Client-facing form of a sale line with its derived figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleLineView {
    pub id: SaleLineId,
    pub event: EventRef,
    pub sku: SkuRef,
    pub sale_date: NaiveDate,
    pub units: u32,
    pub price_unit: Money,
    pub cost_unit: Money,
    pub is_bundle: bool,
    pub bundle_id: Option<String>,
    pub bundle_size: Option<u32>,
    pub bundle_price: Option<Money>,
    pub is_gift: bool,
    pub notes: String,
    pub revenue: Money,
    pub cogs: Money,
    pub gross_margin_unit: Money,
    pub gross_profit: Money,
}

impl From<&SaleLineRecord> for SaleLineView {
    fn from(record: &SaleLineRecord) -> Self {
        let line = &record.line;
        let figures = Figures::of_line(line);
        Self {
            id: line.id,
            event: record.event.clone(),
            sku: record.sku.clone(),
            sale_date: line.sale_date,
            units: line.units,
            price_unit: line.price_unit,
            cost_unit: line.cost_unit,
            is_bundle: line.is_bundle,
            bundle_id: line.bundle.as_ref().map(|b| b.bundle_id.clone()),
            bundle_size: line.bundle.as_ref().map(|b| b.size),
            bundle_price: line.bundle.as_ref().map(|b| b.price),
            is_gift: line.is_gift,
            notes: line.notes.clone().unwrap_or_default(),
            revenue: figures.revenue,
            cogs: figures.cogs,
            gross_margin_unit: line.price_unit - line.cost_unit,
            gross_profit: figures.gross_profit,
        }
    }
}
