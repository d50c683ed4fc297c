//! Complaint business logic.
//!
//! Residents raise complaints; admins move them through
//! pending -> in-progress -> resolved. The status rule lives in
//! [`lifecycle::complaint_transition`].

use crate::{
    config::settings::ComplaintTransitions,
    core::{
        lifecycle,
        principal::{Principal, Role},
    },
    entities::{
        Complaint,
        complaint::{self, ComplaintCategory, ComplaintStatus},
    },
    errors::{Error, Result},
    store::{Collection, Store},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Select, Set, prelude::*};
use tracing::{info, warn};
use uuid::Uuid;

/// Input for [`raise_complaint`].
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub category: ComplaintCategory,
    pub apartment_number: String,
    /// URL of an already uploaded attachment
    pub image_url: Option<String>,
}

/// Records a new complaint raised by a resident. It starts as `pending`.
pub async fn raise_complaint(
    store: &Store,
    principal: &Principal,
    input: NewComplaint,
) -> Result<complaint::Model> {
    principal.require(&[Role::Resident], "raise complaints")?;

    if input.title.trim().is_empty() {
        return Err(Error::MissingField { field: "title" });
    }
    if input.apartment_number.trim().is_empty() {
        return Err(Error::MissingField {
            field: "apartment_number",
        });
    }

    let complaint = complaint::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        category: Set(input.category),
        raised_by: Set(principal.id.clone()),
        apartment_number: Set(input.apartment_number),
        image_url: Set(input.image_url),
        status: Set(ComplaintStatus::Pending),
        created_at: Set(Utc::now()),
        resolved_at: Set(None),
    };

    let model = store.create(Collection::Complaints, complaint).await?;
    info!(id = %model.id, category = ?model.category, "Complaint raised");
    Ok(model)
}

/// Changes a complaint's status under the configured policy.
pub async fn set_complaint_status(
    store: &Store,
    principal: &Principal,
    complaint_id: &str,
    requested: ComplaintStatus,
    policy: ComplaintTransitions,
) -> Result<complaint::Model> {
    principal.require(&[Role::Admin], "update complaint status")?;
    if complaint_id.trim().is_empty() {
        return Err(Error::MissingField { field: "id" });
    }

    let current = Complaint::find_by_id(complaint_id.to_string())
        .one(store.connection())
        .await?
        .ok_or_else(|| Error::NotFound {
            collection: Collection::Complaints,
            id: complaint_id.to_string(),
        })?;

    let patch = lifecycle::complaint_transition(&current, requested, policy, Utc::now())
        .inspect_err(|e| warn!(id = complaint_id, "Complaint status change rejected: {e}"))?;

    let model = store
        .update_if::<Complaint, _>(
            Collection::Complaints,
            current.id.clone(),
            Condition::all().add(complaint::Column::Status.eq(current.status)),
            patch.into_active_model(),
        )
        .await?
        .ok_or_else(|| {
            warn!(id = complaint_id, "Complaint status changed concurrently");
            Error::from(lifecycle::invalid("complaint", current.status, requested))
        })?;
    info!(id = %model.id, status = %model.status, "Complaint status updated");
    Ok(model)
}

/// Every complaint, newest first.
#[must_use]
pub fn all_complaints() -> Select<Complaint> {
    Complaint::find().order_by_desc(complaint::Column::CreatedAt)
}

/// Complaints raised by one account, newest first.
#[must_use]
pub fn complaints_raised_by(user_id: &str) -> Select<Complaint> {
    all_complaints().filter(complaint::Column::RaisedBy.eq(user_id))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_raise_complaint_starts_pending() -> Result<()> {
        let store = setup_test_store().await?;
        let resident = resident_principal(&store, "Asha", "B-204").await?;

        let complaint = create_test_complaint(&store, &resident, "Leaking tap").await?;
        assert_eq!(complaint.status, ComplaintStatus::Pending);
        assert_eq!(complaint.raised_by, resident.id);
        assert!(complaint.resolved_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_only_residents_raise_complaints() -> Result<()> {
        let store = setup_test_store().await?;
        let result = create_test_complaint(&store, &admin_principal(), "Leaking tap").await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_resolution_stamps_and_regression_clears() -> Result<()> {
        let store = setup_test_store().await?;
        let resident = resident_principal(&store, "Asha", "B-204").await?;
        let admin = admin_principal();
        let complaint = create_test_complaint(&store, &resident, "Leaking tap").await?;

        let resolved = set_complaint_status(
            &store,
            &admin,
            &complaint.id,
            ComplaintStatus::Resolved,
            ComplaintTransitions::Permissive,
        )
        .await?;
        assert_eq!(resolved.status, ComplaintStatus::Resolved);
        assert!(resolved.resolved_at.is_some());

        let reopened = set_complaint_status(
            &store,
            &admin,
            &complaint.id,
            ComplaintStatus::InProgress,
            ComplaintTransitions::Permissive,
        )
        .await?;
        assert_eq!(reopened.status, ComplaintStatus::InProgress);
        assert!(reopened.resolved_at.is_none());
        assert_eq!(reopened.category, complaint.category);
        assert_eq!(reopened.raised_by, complaint.raised_by);
        Ok(())
    }

    #[tokio::test]
    async fn test_forward_only_rejects_regression() -> Result<()> {
        let store = setup_test_store().await?;
        let resident = resident_principal(&store, "Asha", "B-204").await?;
        let admin = admin_principal();
        let complaint = create_test_complaint(&store, &resident, "Broken light").await?;

        set_complaint_status(
            &store,
            &admin,
            &complaint.id,
            ComplaintStatus::Resolved,
            ComplaintTransitions::ForwardOnly,
        )
        .await?;
        let result = set_complaint_status(
            &store,
            &admin,
            &complaint.id,
            ComplaintStatus::Pending,
            ComplaintTransitions::ForwardOnly,
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_complaint_is_not_found() -> Result<()> {
        let store = setup_test_store().await?;
        let result = set_complaint_status(
            &store,
            &admin_principal(),
            "missing",
            ComplaintStatus::Resolved,
            ComplaintTransitions::Permissive,
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_complaints_raised_by_filters_owner() -> Result<()> {
        let store = setup_test_store().await?;
        let asha = resident_principal(&store, "Asha", "B-204").await?;
        let ravi = resident_principal(&store, "Ravi", "C-101").await?;
        create_test_complaint(&store, &asha, "Leaking tap").await?;
        create_test_complaint(&store, &ravi, "Noise").await?;
        create_test_complaint(&store, &asha, "Lift stuck").await?;

        let mine = store.fetch(complaints_raised_by(&asha.id)).await?;
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|c| c.raised_by == asha.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_forward_moves_admit_one() -> Result<()> {
        let store = setup_test_store().await?;
        let resident = resident_principal(&store, "Asha", "B-204").await?;
        let admin = admin_principal();
        let complaint = create_test_complaint(&store, &resident, "Lift stuck").await?;

        let (to_progress, to_resolved) = tokio::join!(
            set_complaint_status(
                &store,
                &admin,
                &complaint.id,
                ComplaintStatus::InProgress,
                ComplaintTransitions::ForwardOnly,
            ),
            set_complaint_status(
                &store,
                &admin,
                &complaint.id,
                ComplaintStatus::Resolved,
                ComplaintTransitions::ForwardOnly,
            ),
        );

        // Serialized, in-progress then resolved is a legal pair; otherwise the
        // second write must see that the status moved under it.
        let stored = store.fetch(all_complaints()).await?;
        assert_eq!(stored.len(), 1);
        match (&to_progress, &to_resolved) {
            (Ok(_), Ok(_)) => assert_eq!(stored[0].status, ComplaintStatus::Resolved),
            (Ok(_), Err(e)) | (Err(e), Ok(_)) => {
                assert!(matches!(e, Error::InvalidTransition { .. }));
            }
            (Err(_), Err(_)) => unreachable!("one forward move always applies"),
        }
        assert_eq!(
            stored[0].resolved_at.is_some(),
            stored[0].status == ComplaintStatus::Resolved
        );
        Ok(())
    }
}
