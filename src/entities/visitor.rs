//! Visitor entity - Gate log entries.
//!
//! A visitor is either preapproved by a resident or logged manually at the gate
//! by security (in which case it starts out `inside`). Rejection is its own
//! status with its own timestamp, so `exit_time` always implies `entry_time`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the visitor record was created.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum VisitorKind {
    #[sea_orm(string_value = "preapproved")]
    Preapproved,
    #[sea_orm(string_value = "manual")]
    Manual,
}

/// Where the visitor is in the gate lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, DeriveActiveEnum,
    Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum VisitorStatus {
    /// Expected, not yet at the gate
    #[sea_orm(string_value = "preapproved")]
    Preapproved,
    /// Entry granted, still on the premises
    #[sea_orm(string_value = "inside")]
    Inside,
    /// Left the premises
    #[sea_orm(string_value = "exited")]
    Exited,
    /// Turned away at the gate before entering
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl VisitorStatus {
    /// Stored label for this status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Preapproved => "preapproved",
            Self::Inside => "inside",
            Self::Exited => "exited",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VisitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Visitor database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "visitors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub phone: String,
    pub apartment_number: String,
    pub kind: VisitorKind,
    pub status: VisitorStatus,
    /// Account id that created the record (resident or guard)
    pub created_by: String,
    pub entry_time: Option<DateTimeUtc>,
    pub exit_time: Option<DateTimeUtc>,
    pub rejected_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
