//! Caller identity.
//!
//! Every mutation takes the acting [`Principal`] as an argument; nothing in the
//! crate reads "the current user" from shared state.

use crate::errors::{Error, Result};
pub use crate::entities::resident::Role;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Account id
    pub id: String,
    /// Account role
    pub role: Role,
}

impl Principal {
    /// Creates a principal.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Fails with [`Error::Unauthorized`] unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Role], action: &'static str) -> Result<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::warn!(principal = %self.id, role = %self.role, action, "Unauthorized action");
            Err(Error::Unauthorized {
                role: self.role,
                action,
            })
        }
    }
}
