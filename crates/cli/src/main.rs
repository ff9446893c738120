mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde_json::Value as JsonValue;

use tally_analytics::{PricingRule, SaleQueryParams};
use tally_core::OwnerId;
use tally_infra::service::parse_id;
use tally_infra::{
    AppConfig, BundleLine, InMemoryLedgerStore, LedgerService, LedgerSnapshot, LedgerStore,
    ServiceError,
};

use crate::cli::{Cli, Command, RawBundleLine};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            match err.downcast_ref::<ServiceError>() {
                Some(service) => eprintln!("{}", service.to_json()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let config = AppConfig::from_env().context("reading TALLY_* configuration")?;
    tally_observability::init(cli.log_format.unwrap_or(config.log_format));
    config.warn_defaults();

    let path = cli
        .ledger
        .clone()
        .or_else(|| config.ledger_path.clone())
        .context("no ledger snapshot: pass --ledger or set TALLY_LEDGER_PATH")?;
    let owner = match cli.owner.as_deref() {
        Some(raw) => OwnerId::new(raw)?,
        None => config
            .owner
            .clone()
            .context("no owner: pass --owner or set TALLY_OWNER")?,
    };

    let service = LedgerService::new(open_store(&path)?);
    tracing::info!(owner = %owner, ledger = %path.display(), "ledger opened");

    let output = execute(&service, &owner, cli.command, &config)?;
    Ok(serde_json::to_string_pretty(&output)?)
}

fn open_store(path: &Path) -> anyhow::Result<InMemoryLedgerStore> {
    let snapshot = LedgerSnapshot::load(path)
        .with_context(|| format!("loading ledger snapshot {}", path.display()))?;
    Ok(InMemoryLedgerStore::from_snapshot(snapshot)?)
}

fn execute<S: LedgerStore>(
    service: &LedgerService<S>,
    owner: &OwnerId,
    command: Command,
    config: &AppConfig,
) -> anyhow::Result<JsonValue> {
    let output = match command {
        Command::Sales(filter) => {
            serde_json::to_value(service.list_sales(owner, &SaleQueryParams::from(filter))?)?
        }
        Command::Summary { filter, group } => {
            serde_json::to_value(service.summary(owner, &filter.into(), group)?)?
        }
        Command::TopBottom {
            filter,
            metric,
            limit,
        } => {
            let limit = limit.unwrap_or(config.rank_limit);
            serde_json::to_value(service.top_bottom(owner, &filter.into(), metric, limit)?)?
        }
        Command::Hypo {
            filter,
            rules,
            rules_file,
        } => {
            let rules = load_rules(rules.as_deref(), rules_file.as_deref())?;
            serde_json::to_value(service.hypothetical(owner, &filter.into(), &rules)?)?
        }
        Command::AvgCost => serde_json::to_value(service.average_cost_by_type(owner)?)?,
        Command::BundleQuote { price, lines } => {
            let lines = resolve_bundle_lines(lines)?;
            serde_json::to_value(service.quote_bundle(owner, &lines, price)?)?
        }
    };
    Ok(output)
}

fn load_rules(inline: Option<&str>, file: Option<&Path>) -> anyhow::Result<Vec<PricingRule>> {
    let json = match (inline, file) {
        (Some(json), _) => json.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading rules file {}", path.display()))?,
        (None, None) => anyhow::bail!("pass --rules or --rules-file"),
    };
    serde_json::from_str(&json).context("parsing pricing rules")
}

fn resolve_bundle_lines(raw: Vec<RawBundleLine>) -> anyhow::Result<Vec<BundleLine>> {
    raw.into_iter()
        .map(|line| {
            Ok(BundleLine {
                sku_id: parse_id("sku", &line.sku)?,
                units: line.units,
                cost_unit: line.cost,
            })
        })
        .collect()
}
