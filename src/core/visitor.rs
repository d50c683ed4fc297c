//! Visitor gate log.
//!
//! Residents preapprove expected guests; security staff grant entry, record
//! exits, reject preapproved guests at the gate, or log walk-ins that go
//! straight inside.

use crate::{
    core::{
        lifecycle,
        principal::{Principal, Role},
    },
    entities::{
        Visitor,
        visitor::{self, VisitorKind, VisitorStatus},
    },
    errors::{Error, Result},
    store::{Collection, Store},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Select, Set, prelude::*};
use tracing::{info, warn};
use uuid::Uuid;

const GATE_ROLES: &[Role] = &[Role::Security, Role::Admin];

/// Input for [`preapprove_visitor`] and [`log_manual_entry`].
#[derive(Debug, Clone)]
pub struct NewVisitor {
    pub name: String,
    pub phone: String,
    pub apartment_number: String,
}

fn validate(input: &NewVisitor) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::MissingField { field: "name" });
    }
    if input.apartment_number.trim().is_empty() {
        return Err(Error::MissingField {
            field: "apartment_number",
        });
    }
    Ok(())
}

/// A resident registers an expected guest.
pub async fn preapprove_visitor(
    store: &Store,
    principal: &Principal,
    input: NewVisitor,
) -> Result<visitor::Model> {
    principal.require(&[Role::Resident], "preapprove visitors")?;
    validate(&input)?;

    let visitor = visitor::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(input.name.trim().to_string()),
        phone: Set(input.phone),
        apartment_number: Set(input.apartment_number),
        kind: Set(VisitorKind::Preapproved),
        status: Set(VisitorStatus::Preapproved),
        created_by: Set(principal.id.clone()),
        entry_time: Set(None),
        exit_time: Set(None),
        rejected_at: Set(None),
        created_at: Set(Utc::now()),
    };

    let model = store.create(Collection::Visitors, visitor).await?;
    info!(id = %model.id, apartment = %model.apartment_number, "Visitor preapproved");
    Ok(model)
}

/// Security logs a walk-in visitor, who is inside from the moment of logging.
pub async fn log_manual_entry(
    store: &Store,
    principal: &Principal,
    input: NewVisitor,
) -> Result<visitor::Model> {
    principal.require(GATE_ROLES, "log visitor entries")?;
    validate(&input)?;

    let now = Utc::now();
    let visitor = visitor::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(input.name.trim().to_string()),
        phone: Set(input.phone),
        apartment_number: Set(input.apartment_number),
        kind: Set(VisitorKind::Manual),
        status: Set(VisitorStatus::Inside),
        created_by: Set(principal.id.clone()),
        entry_time: Set(Some(now)),
        exit_time: Set(None),
        rejected_at: Set(None),
        created_at: Set(now),
    };

    let model = store.create(Collection::Visitors, visitor).await?;
    info!(id = %model.id, apartment = %model.apartment_number, "Walk-in visitor logged");
    Ok(model)
}

async fn transition(
    store: &Store,
    principal: &Principal,
    visitor_id: &str,
    requested: VisitorStatus,
    action: &'static str,
) -> Result<visitor::Model> {
    principal.require(GATE_ROLES, action)?;
    if visitor_id.trim().is_empty() {
        return Err(Error::MissingField { field: "id" });
    }

    let current = Visitor::find_by_id(visitor_id.to_string())
        .one(store.connection())
        .await?
        .ok_or_else(|| Error::NotFound {
            collection: Collection::Visitors,
            id: visitor_id.to_string(),
        })?;

    let patch = lifecycle::visitor_transition(&current, requested, Utc::now())
        .inspect_err(|e| warn!(id = visitor_id, "Visitor {action} rejected: {e}"))?;

    // Another gate action may have moved the visitor since it was read.
    let model = store
        .update_if::<Visitor, _>(
            Collection::Visitors,
            current.id.clone(),
            Condition::all().add(visitor::Column::Status.eq(current.status)),
            patch.into_active_model(),
        )
        .await?
        .ok_or_else(|| {
            warn!(id = visitor_id, "Visitor {action} lost to a concurrent change");
            Error::from(lifecycle::invalid("visitor", current.status, requested))
        })?;
    info!(id = %model.id, status = %model.status, "Visitor status updated");
    Ok(model)
}

/// Lets a preapproved visitor in.
pub async fn grant_entry(
    store: &Store,
    principal: &Principal,
    visitor_id: &str,
) -> Result<visitor::Model> {
    transition(store, principal, visitor_id, VisitorStatus::Inside, "grant entry").await
}

/// Records that a visitor inside has left.
pub async fn mark_exit(
    store: &Store,
    principal: &Principal,
    visitor_id: &str,
) -> Result<visitor::Model> {
    transition(store, principal, visitor_id, VisitorStatus::Exited, "mark exits").await
}

/// Turns a preapproved visitor away at the gate.
pub async fn reject_visitor(
    store: &Store,
    principal: &Principal,
    visitor_id: &str,
) -> Result<visitor::Model> {
    transition(store, principal, visitor_id, VisitorStatus::Rejected, "reject visitors").await
}

/// Every visitor, newest first.
#[must_use]
pub fn all_visitors() -> Select<Visitor> {
    Visitor::find().order_by_desc(visitor::Column::CreatedAt)
}

/// Visitors for one apartment, newest first.
#[must_use]
pub fn visitors_for_apartment(apartment_number: &str) -> Select<Visitor> {
    all_visitors().filter(visitor::Column::ApartmentNumber.eq(apartment_number))
}

/// Visitors currently in `status`, newest first.
#[must_use]
pub fn visitors_with_status(status: VisitorStatus) -> Select<Visitor> {
    all_visitors().filter(visitor::Column::Status.eq(status))
}
