//! Maintenance payments.
//!
//! A payment document exists only once a month has been marked paid; every
//! other (account, month) pair is implicitly due. The document id
//! `{user_id}_{month}` keeps one record per pair, so marking paid twice
//! overwrites rather than appends.

use crate::{
    core::{
        lifecycle::{self, MarkPaid},
        principal::{Principal, Role},
    },
    entities::{
        Payment,
        payment::{self, PaymentStatus},
        resident,
    },
    errors::Result,
    store::{Collection, Store},
};
use chrono::Utc;
use sea_orm::{IntoActiveModel, QueryOrder, Select, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Deterministic payment document id.
#[must_use]
pub fn payment_id(user_id: &str, month: &str) -> String {
    format!("{user_id}_{month}")
}

/// Due date for a billing month, `YYYY-MM-DD`.
#[must_use]
pub fn due_date(month: &str, due_day: u32) -> String {
    format!("{month}-{due_day:02}")
}

impl MarkPaid {
    /// Builds the request from the canonical profile instead of form input.
    #[must_use]
    pub fn from_profile(profile: &resident::Model, month: &str, amount: f64) -> Self {
        Self {
            user_id: profile.id.clone(),
            month: month.to_string(),
            amount,
            resident_name: profile.name.clone(),
            apartment_number: profile.apartment_number.clone(),
        }
    }
}

/// Records a month as paid. Idempotent: the latest call's values win.
pub async fn mark_paid(
    store: &Store,
    principal: &Principal,
    request: &MarkPaid,
    due_day: u32,
) -> Result<payment::Model> {
    principal.require(&[Role::Admin], "mark payments")?;

    let key = payment_id(&request.user_id, &request.month);
    let current = Payment::find_by_id(key.clone())
        .one(store.connection())
        .await?;
    let document = lifecycle::mark_paid_transition(current.as_ref(), request, due_day, Utc::now())?;

    let model = store
        .upsert::<Payment, _>(
            Collection::Payments,
            key,
            document.into_active_model().reset_all(),
        )
        .await?;
    info!(id = %model.id, amount = model.amount, "Payment marked paid");
    Ok(model)
}

/// Payments recorded for one month, by apartment.
#[must_use]
pub fn payments_for_month(month: &str) -> Select<Payment> {
    Payment::find()
        .filter(payment::Column::Month.eq(month))
        .order_by_asc(payment::Column::ApartmentNumber)
}

/// Payments recorded for one account, newest month first.
#[must_use]
pub fn payments_for_user(user_id: &str) -> Select<Payment> {
    Payment::find()
        .filter(payment::Column::UserId.eq(user_id))
        .order_by_desc(payment::Column::Month)
}

/// Effective status of a single account for the month.
pub fn status_for(payments: &[payment::Model], user_id: &str, month: &str) -> PaymentStatus {
    let id = payment_id(user_id, month);
    payments
        .iter()
        .find(|p| p.id == id)
        .map_or(PaymentStatus::Due, |p| p.status)
}

/// One roster line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterLine {
    pub user_id: String,
    pub resident_name: String,
    pub apartment_number: String,
    pub status: PaymentStatus,
    pub amount: Option<f64>,
}

/// Month roster across every resident.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentRoster {
    pub month: String,
    pub lines: Vec<RosterLine>,
    pub paid: usize,
    pub due: usize,
    pub collected: f64,
}

/// Lists every resident with their status for `month`; residents without a
/// payment record are due.
#[must_use]
pub fn payment_roster(
    residents: &[resident::Model],
    payments: &[payment::Model],
    month: &str,
) -> PaymentRoster {
    let by_id: HashMap<&str, &payment::Model> = payments
        .iter()
        .filter(|p| p.month == month)
        .map(|p| (p.id.as_str(), p))
        .collect();

    let mut roster = PaymentRoster {
        month: month.to_string(),
        ..PaymentRoster::default()
    };

    for profile in residents {
        let record = by_id.get(payment_id(&profile.id, month).as_str()).copied();
        let status = record.map_or(PaymentStatus::Due, |p| p.status);
        match status {
            PaymentStatus::Paid => {
                roster.paid += 1;
                roster.collected += record.map_or(0.0, |p| p.amount);
            }
            PaymentStatus::Due => roster.due += 1,
        }
        roster.lines.push(RosterLine {
            user_id: profile.id.clone(),
            resident_name: profile.name.clone(),
            apartment_number: profile.apartment_number.clone(),
            status,
            amount: record.map(|p| p.amount),
        });
    }

    roster
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::errors::Error;
    use crate::test_utils::*;

    fn request(user_id: &str, amount: f64, name: &str) -> MarkPaid {
        MarkPaid {
            user_id: user_id.to_string(),
            month: "2024-03".to_string(),
            amount,
            resident_name: name.to_string(),
            apartment_number: "B-204".to_string(),
        }
    }

    #[test]
    fn test_ids_and_due_dates() {
        assert_eq!(payment_id("res-1", "2024-03"), "res-1_2024-03");
        assert_eq!(due_date("2024-03", 5), "2024-03-05");
        assert_eq!(due_date("2024-03", 15), "2024-03-15");
    }

    #[tokio::test]
    async fn test_mark_paid_twice_keeps_one_record() -> Result<()> {
        let store = setup_test_store().await?;
        let admin = admin_principal();

        mark_paid(&store, &admin, &request("res-1", 2000.0, "Asha"), 5).await?;
        let latest = mark_paid(&store, &admin, &request("res-1", 2500.0, "Asha K"), 5).await?;
        assert_eq!(latest.amount, 2500.0);

        let records = store.fetch(payments_for_user("res-1")).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "res-1_2024-03");
        assert_eq!(records[0].amount, 2500.0);
        assert_eq!(records[0].resident_name, "Asha K");
        assert_eq!(records[0].status, PaymentStatus::Paid);
        assert!(records[0].paid_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_only_admins_mark_paid() -> Result<()> {
        let store = setup_test_store().await?;
        let resident = resident_principal(&store, "Asha", "B-204").await?;
        let result = mark_paid(&store, &resident, &request(&resident.id, 2000.0, "Asha"), 5).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_paid_requires_month_key() -> Result<()> {
        let store = setup_test_store().await?;
        let mut bad = request("res-1", 2000.0, "Asha");
        bad.month = "03/2024".to_string();
        let result = mark_paid(&store, &admin_principal(), &bad, 5).await;
        assert!(matches!(result, Err(Error::MissingField { field: "month" })));
        Ok(())
    }

    #[tokio::test]
    async fn test_roster_treats_missing_records_as_due() -> Result<()> {
        let store = setup_test_store().await?;
        let asha = create_test_resident(&store, "Asha", "A-001").await?;
        let ravi = create_test_resident(&store, "Ravi", "C-101").await?;

        mark_paid(
            &store,
            &admin_principal(),
            &MarkPaid::from_profile(&asha, "2024-03", 2500.0),
            5,
        )
        .await?;

        let residents = store.fetch(crate::core::resident::residents_query()).await?;
        let payments = store.fetch(payments_for_month("2024-03")).await?;
        let roster = payment_roster(&residents, &payments, "2024-03");

        assert_eq!(roster.paid, 1);
        assert_eq!(roster.due, 1);
        assert_eq!(roster.collected, 2500.0);
        assert_eq!(roster.lines[0].apartment_number, "A-001");
        assert_eq!(roster.lines[0].status, PaymentStatus::Paid);
        assert_eq!(roster.lines[1].user_id, ravi.id);
        assert_eq!(roster.lines[1].status, PaymentStatus::Due);
        assert_eq!(status_for(&payments, &ravi.id, "2024-03"), PaymentStatus::Due);
        Ok(())
    }
}
