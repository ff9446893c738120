use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use tally_analytics::{GroupBy, Metric, SaleQueryParams};
use tally_core::Money;
use tally_observability::LogFormat;

/// Sales ledger analytics over a JSON ledger snapshot.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about, long_about = None)]
pub struct Cli {
    /// Ledger snapshot to read (overrides TALLY_LEDGER_PATH).
    #[arg(global = true, long)]
    pub ledger: Option<PathBuf>,

    /// Owner whose ledger to report on (overrides TALLY_OWNER).
    #[arg(global = true, long)]
    pub owner: Option<String>,

    /// Log output: json or pretty (overrides TALLY_LOG_FORMAT).
    #[arg(global = true, long)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List sale lines, newest first.
    Sales(FilterArgs),

    /// Grouped revenue, cost and profit totals.
    Summary {
        #[command(flatten)]
        filter: FilterArgs,

        /// sku, item_type, event or ym.
        #[arg(long, default_value = "item_type")]
        group: GroupBy,
    },

    /// Best and worst SKUs by a metric.
    TopBottom {
        #[command(flatten)]
        filter: FilterArgs,

        /// units, revenue, cogs or gross_profit.
        #[arg(long, default_value = "gross_profit")]
        metric: Metric,

        /// How many SKUs per list (defaults to TALLY_RANK_LIMIT).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Re-price matching sales and report the totals.
    Hypo {
        #[command(flatten)]
        filter: FilterArgs,

        /// Pricing rules as a JSON array.
        #[arg(long, conflicts_with = "rules_file", required_unless_present = "rules_file")]
        rules: Option<String>,

        /// File holding the pricing rules JSON array.
        #[arg(long)]
        rules_file: Option<PathBuf>,
    },

    /// Average default cost per item type.
    AvgCost,

    /// Profit of selling SKUs together at one price.
    BundleQuote {
        /// Combined bundle price.
        #[arg(long)]
        price: Money,

        /// Bundle component as SKU_ID:UNITS or SKU_ID:UNITS:COST (repeatable).
        #[arg(long = "line", value_parser = parse_bundle_line)]
        lines: Vec<RawBundleLine>,
    },
}

/// Sale filters; malformed values select nothing rather than failing.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub event: Option<String>,

    #[arg(long)]
    pub year: Option<String>,

    /// Only applies together with --year.
    #[arg(long)]
    pub month: Option<String>,

    #[arg(long)]
    pub sku: Option<String>,

    /// Item type: print, keychain, sticker or other.
    #[arg(long = "type")]
    pub item_type: Option<String>,

    /// 1/true/yes/y for bundle lines, anything else for single sales.
    #[arg(long)]
    pub bundle: Option<String>,
}

impl From<FilterArgs> for SaleQueryParams {
    fn from(args: FilterArgs) -> Self {
        SaleQueryParams {
            event: args.event,
            year: args.year,
            month: args.month,
            sku: args.sku,
            item_type: args.item_type,
            bundle: args.bundle,
        }
    }
}

/// `--line` value before the SKU is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBundleLine {
    pub sku: String,
    pub units: u32,
    pub cost: Option<Money>,
}

fn parse_bundle_line(raw: &str) -> Result<RawBundleLine, String> {
    let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
    let (sku, units, cost) = match parts.as_slice() {
        [sku, units] => (*sku, *units, None),
        [sku, units, cost] => (*sku, *units, Some(*cost)),
        _ => return Err(format!("expected SKU_ID:UNITS[:COST], got '{raw}'")),
    };

    let units = units
        .parse::<u32>()
        .map_err(|_| format!("units '{units}' is not a whole number"))?;
    let cost = cost
        .map(|c| c.parse::<Money>().map_err(|e| e.to_string()))
        .transpose()?;

    Ok(RawBundleLine {
        sku: sku.to_string(),
        units,
        cost,
    })
}
