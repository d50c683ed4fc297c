//! Resident entity - The canonical profile behind every signed-in identity.
//!
//! Despite the name this table holds every account (admins and security staff
//! included); the `role` column tells them apart.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role attached to an account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Community administrator
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Apartment resident
    #[sea_orm(string_value = "resident")]
    Resident,
    /// Gate security staff
    #[sea_orm(string_value = "security")]
    Security,
}

impl Role {
    /// Stored label for this role.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Resident => "resident",
            Self::Security => "security",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resident profile model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "residents")]
pub struct Model {
    /// Opaque account identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Account role
    pub role: Role,
    /// Apartment number, empty for staff accounts
    pub apartment_number: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// When the profile was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
