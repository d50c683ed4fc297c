//! Unified error types for `ResiHub`.
//!
//! Lifecycle rules report rejections through [`TransitionError`], a plain value
//! with no I/O attached. Everything that crosses the store boundary is folded
//! into [`Error`].

use crate::{core::principal::Role, store::Collection};
use sea_orm::DbErr;
use thiserror::Error;

/// Rejection returned by a lifecycle rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The requested status change is not in the admissible set.
    #[error("cannot move {entity} from {from} to {to}")]
    InvalidTransition {
        /// Entity family (`"complaint"`, `"visitor"`, ...)
        entity: &'static str,
        /// Current status label
        from: String,
        /// Requested status label
        to: String,
    },

    /// A correlating field (id, user id, month key) is absent or malformed.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the field
        field: &'static str,
    },
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] DbErr),

    #[error("Invalid transition for {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("No document {id} in {collection}")]
    NotFound { collection: Collection, id: String },

    #[error("Role {role} is not allowed to {action}")]
    Unauthorized { role: Role, action: &'static str },
}

impl From<TransitionError> for Error {
    fn from(value: TransitionError) -> Self {
        match value {
            TransitionError::InvalidTransition { entity, from, to } => {
                Self::InvalidTransition { entity, from, to }
            }
            TransitionError::MissingField { field } => Self::MissingField { field },
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
