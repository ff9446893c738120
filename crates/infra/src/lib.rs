//! Infrastructure layer: ledger storage, the owner-scoped service, config.

pub mod config;
pub mod error;
pub mod service;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{AppConfig, ConfigError};
pub use error::{ServiceError, ServiceResult, StoreError, StoreResult};
pub use service::{BundleLine, LedgerService};
pub use store::{InMemoryLedgerStore, LedgerSnapshot, LedgerStore};
