//! Store and service error model.
//!
//! `StoreError` covers storage failures (locks, snapshot IO, uniqueness).
//! `ServiceError` unifies those with `DomainError` and carries the stable code
//! and HTTP-equivalent status the request layer reports.

use serde_json::{Value as JsonValue, json};
use thiserror::Error;

use tally_core::{DomainError, ValidationErrors};

pub type StoreResult<T> = Result<T, StoreError>;
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated on insert/update.
    #[error("unique constraint violated: {0}")]
    Unique(String),

    /// Update or delete of a row that does not exist for this owner.
    #[error("{entity} not found: {id}")]
    Missing { entity: &'static str, id: String },

    /// A delete was refused because other rows still reference the target.
    #[error("still referenced: {0}")]
    Referenced(String),

    /// A writer panicked while holding the table lock.
    #[error("store lock poisoned: {0}")]
    Poisoned(&'static str),

    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot decode: {0}")]
    Decode(#[from] serde_json::Error),

    /// The snapshot decoded but its contents are inconsistent.
    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}

impl StoreError {
    pub fn missing(entity: &'static str, id: impl ToString) -> Self {
        Self::Missing {
            entity,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    ConflictBlocked(String),

    #[error("already exists: {0}")]
    UniqueViolation(String),

    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(errors) => ServiceError::Validation(errors),
            DomainError::InvalidId(msg) => {
                let mut errors = ValidationErrors::new();
                errors.push("id", msg);
                ServiceError::Validation(errors)
            }
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unique(msg) => ServiceError::UniqueViolation(msg),
            StoreError::Missing { entity, id } => ServiceError::NotFound { entity, id },
            StoreError::Referenced(msg) => ServiceError::ConflictBlocked(msg),
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::ConflictBlocked(_) => "conflict",
            ServiceError::UniqueViolation(_) => "unique_violation",
            ServiceError::Store(_) => "store_error",
        }
    }

    /// HTTP-equivalent status.
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::NotFound { .. } => 404,
            ServiceError::ConflictBlocked(_) | ServiceError::UniqueViolation(_) => 409,
            ServiceError::Store(_) => 500,
        }
    }

    /// Error body: `{"error": code, "message": ..., "fields": [...]?}`.
    pub fn to_json(&self) -> JsonValue {
        let mut body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        if let ServiceError::Validation(errors) = self {
            body["fields"] = json!(errors);
        }
        body
    }
}
