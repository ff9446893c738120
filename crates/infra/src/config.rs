//! Process configuration from `TALLY_*` environment variables.

use std::path::PathBuf;

use thiserror::Error;

use tally_core::OwnerId;
use tally_observability::LogFormat;

pub const DEFAULT_RANK_LIMIT: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `TALLY_LEDGER_PATH`: JSON snapshot to open.
    pub ledger_path: Option<PathBuf>,
    /// `TALLY_OWNER`: owner used when a command names none.
    pub owner: Option<OwnerId>,
    /// `TALLY_LOG_FORMAT`: `json` (default) or `pretty`.
    pub log_format: LogFormat,
    /// `TALLY_RANK_LIMIT`: default top/bottom size, at least 1.
    pub rank_limit: usize,
    defaulted: Vec<&'static str>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut defaulted = Vec::new();

        let ledger_path = get("TALLY_LEDGER_PATH").map(PathBuf::from);
        if ledger_path.is_none() {
            defaulted.push("TALLY_LEDGER_PATH");
        }

        let owner = match get("TALLY_OWNER") {
            Some(raw) => Some(OwnerId::new(raw).map_err(|e| ConfigError {
                key: "TALLY_OWNER",
                message: e.to_string(),
            })?),
            None => {
                defaulted.push("TALLY_OWNER");
                None
            }
        };

        let log_format = match get("TALLY_LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|message| ConfigError {
                key: "TALLY_LOG_FORMAT",
                message,
            })?,
            None => {
                defaulted.push("TALLY_LOG_FORMAT");
                LogFormat::default()
            }
        };

        let rank_limit = match get("TALLY_RANK_LIMIT") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError {
                        key: "TALLY_RANK_LIMIT",
                        message: format!("'{raw}' is not a positive integer"),
                    });
                }
            },
            None => {
                defaulted.push("TALLY_RANK_LIMIT");
                DEFAULT_RANK_LIMIT
            }
        };

        Ok(Self {
            ledger_path,
            owner,
            log_format,
            rank_limit,
            defaulted,
        })
    }

    /// Variables that were unset and fell back to defaults.
    pub fn defaulted(&self) -> &[&'static str] {
        &self.defaulted
    }

    /// Logs one warning per defaulted variable. Call once tracing is up.
    pub fn warn_defaults(&self) {
        for key in &self.defaulted {
            tracing::warn!(key = *key, "not set; using default");
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger_path: None,
            owner: None,
            log_format: LogFormat::default(),
            rank_limit: DEFAULT_RANK_LIMIT,
            defaulted: Vec::new(),
        }
    }
}
