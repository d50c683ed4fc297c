//! Payment entity - Monthly maintenance payment status per account.
//!
//! The primary key is `{user_id}_{month}`, which is what keeps a single record
//! per account and month. A missing record means the month is still due.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, DeriveActiveEnum,
    Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "due")]
    Due,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl PaymentStatus {
    /// Stored label for this status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Due => "due",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// `{user_id}_{month}`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    /// Billing month, `YYYY-MM`
    pub month: String,
    pub amount: f64,
    pub status: PaymentStatus,
    pub resident_name: String,
    pub apartment_number: String,
    pub paid_at: Option<DateTimeUtc>,
    /// `YYYY-MM-DD`, derived from the month and the community due day
    pub due_date: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
