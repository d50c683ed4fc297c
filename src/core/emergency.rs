//! Emergency alerts.

use crate::{
    core::{
        lifecycle,
        principal::{Principal, Role},
    },
    entities::{
        Emergency,
        emergency::{self, EmergencyStatus},
    },
    errors::{Error, Result},
    store::{Collection, Store},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Select, Set, prelude::*};
use tracing::{info, warn};
use uuid::Uuid;

/// Input for [`raise_emergency`].
#[derive(Debug, Clone)]
pub struct NewEmergency {
    /// Alert type, e.g. `"Fire"`
    pub kind: String,
    pub description: String,
    pub urgency: Option<String>,
}

/// Broadcasts a new emergency. Any role may raise one.
pub async fn raise_emergency(
    store: &Store,
    principal: &Principal,
    input: NewEmergency,
) -> Result<emergency::Model> {
    if input.kind.trim().is_empty() {
        return Err(Error::MissingField { field: "kind" });
    }

    let alert = emergency::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        kind: Set(input.kind.trim().to_string()),
        description: Set(input.description),
        raised_by: Set(principal.id.clone()),
        raised_by_role: Set(principal.role),
        urgency: Set(input.urgency),
        status: Set(EmergencyStatus::Active),
        created_at: Set(Utc::now()),
        resolved_at: Set(None),
        resolved_by: Set(None),
    };

    let model = store.create(Collection::Emergencies, alert).await?;
    warn!(id = %model.id, kind = %model.kind, raised_by = %model.raised_by, "Emergency raised");
    Ok(model)
}

/// Marks an active emergency as resolved.
pub async fn resolve_emergency(
    store: &Store,
    principal: &Principal,
    emergency_id: &str,
) -> Result<emergency::Model> {
    principal.require(&[Role::Admin, Role::Security], "resolve emergencies")?;
    if emergency_id.trim().is_empty() {
        return Err(Error::MissingField { field: "id" });
    }

    let current = Emergency::find_by_id(emergency_id.to_string())
        .one(store.connection())
        .await?
        .ok_or_else(|| Error::NotFound {
            collection: Collection::Emergencies,
            id: emergency_id.to_string(),
        })?;

    let patch = lifecycle::emergency_transition(
        &current,
        EmergencyStatus::Resolved,
        &principal.id,
        Utc::now(),
    )?;

    let model = store
        .update_if::<Emergency, _>(
            Collection::Emergencies,
            current.id.clone(),
            Condition::all().add(emergency::Column::Status.eq(current.status)),
            patch.into_active_model(),
        )
        .await?
        .ok_or_else(|| {
            warn!(id = emergency_id, "Emergency was resolved concurrently");
            Error::from(lifecycle::invalid(
                "emergency",
                current.status,
                EmergencyStatus::Resolved,
            ))
        })?;
    info!(id = %model.id, resolved_by = %principal.id, "Emergency resolved");
    Ok(model)
}

/// Every emergency, newest first.
#[must_use]
pub fn all_emergencies() -> Select<Emergency> {
    Emergency::find().order_by_desc(emergency::Column::CreatedAt)
}

/// Active emergencies, newest first.
#[must_use]
pub fn active_emergencies() -> Select<Emergency> {
    all_emergencies().filter(emergency::Column::Status.eq(EmergencyStatus::Active))
}

/// Emergencies raised by one account, newest first.
#[must_use]
pub fn emergencies_raised_by(user_id: &str) -> Select<Emergency> {
    all_emergencies().filter(emergency::Column::RaisedBy.eq(user_id))
}
