//! Foundation types for the sales ledger.
//!
//! This crate contains **pure domain** primitives (no storage or IO concerns):
//! identifiers, the fixed-point `Money` type and the domain error model.

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult, FieldError, ValidationErrors};
pub use id::{EventId, OwnerId, SaleLineId, SkuId};
pub use money::{MAX_MONEY_CENTS, Money};
