//! JSON snapshot of a whole ledger (all owners).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use tally_ledger::{Event, SaleLine, Sku};

use crate::error::StoreResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub skus: Vec<Sku>,
    #[serde(default)]
    pub sale_lines: Vec<SaleLine>,
}

impl LedgerSnapshot {
    pub fn load(path: &Path) -> StoreResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: LedgerSnapshot = serde_json::from_reader(reader)?;
        tracing::debug!(
            path = %path.display(),
            events = snapshot.events.len(),
            skus = snapshot.skus.len(),
            sale_lines = snapshot.sale_lines.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }
}
