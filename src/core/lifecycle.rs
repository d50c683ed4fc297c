//! Status lifecycle rules.
//!
//! Each rule looks at the current document and a requested status and either
//! returns the patch that performs the change or a [`TransitionError`]. Rules
//! never touch the store and take the clock as an argument; callers persist the
//! patch themselves.
//!
//! | Entity    | Admissible changes                                            |
//! |-----------|---------------------------------------------------------------|
//! | Complaint | any -> any (permissive) or forward only, see [`ComplaintTransitions`] |
//! | Visitor   | preapproved -> inside, inside -> exited, preapproved -> rejected |
//! | Emergency | active -> resolved                                            |
//! | Payment   | any (including absent) -> paid                                |

use crate::{
    config::settings::ComplaintTransitions,
    entities::{
        complaint::{self, ComplaintStatus},
        emergency::{self, EmergencyStatus},
        payment::{self, PaymentStatus},
        visitor::{self, VisitorStatus},
    },
    errors::TransitionError,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::Unchanged, Set};

/// How a patch treats one optional timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    /// Leave the stored value alone
    Keep,
    /// Write this instant
    Set(DateTime<Utc>),
    /// Write null
    Clear,
}

impl Stamp {
    fn write(self, column: &mut sea_orm::ActiveValue<Option<DateTime<Utc>>>) {
        match self {
            Self::Keep => {}
            Self::Set(at) => *column = Set(Some(at)),
            Self::Clear => *column = Set(None),
        }
    }

    /// Value the column holds after the patch, given its current value.
    #[must_use]
    pub const fn resolve(self, current: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        match self {
            Self::Keep => current,
            Self::Set(at) => Some(at),
            Self::Clear => None,
        }
    }
}

/// Rejection for a change from `from` to `to`.
pub(crate) fn invalid(
    entity: &'static str,
    from: impl ToString,
    to: impl ToString,
) -> TransitionError {
    TransitionError::InvalidTransition {
        entity,
        from: from.to_string(),
        to: to.to_string(),
    }
}

fn require_id(id: &str) -> Result<(), TransitionError> {
    if id.trim().is_empty() {
        return Err(TransitionError::MissingField { field: "id" });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Complaints
// ---------------------------------------------------------------------------

/// Patch produced by a complaint status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintPatch {
    pub id: String,
    pub status: ComplaintStatus,
    pub resolved_at: Stamp,
}

impl ComplaintPatch {
    /// Active model carrying only the patched columns.
    #[must_use]
    pub fn into_active_model(self) -> complaint::ActiveModel {
        let mut model = complaint::ActiveModel {
            id: Unchanged(self.id),
            status: Set(self.status),
            ..Default::default()
        };
        self.resolved_at.write(&mut model.resolved_at);
        model
    }
}

/// Validates a complaint status change.
///
/// Moving into `resolved` stamps `resolved_at`; moving out of it clears the
/// stamp. Re-selecting the current status is a no-op patch under the permissive
/// policy and a rejection under the forward-only one.
pub fn complaint_transition(
    current: &complaint::Model,
    requested: ComplaintStatus,
    policy: ComplaintTransitions,
    now: DateTime<Utc>,
) -> Result<ComplaintPatch, TransitionError> {
    require_id(&current.id)?;

    let from = current.status;
    let admissible = match policy {
        ComplaintTransitions::Permissive => true,
        ComplaintTransitions::ForwardOnly => requested > from,
    };
    if !admissible {
        return Err(invalid("complaint", from, requested));
    }

    let resolved_at = match (from, requested) {
        (ComplaintStatus::Resolved, ComplaintStatus::Resolved) => Stamp::Keep,
        (_, ComplaintStatus::Resolved) => Stamp::Set(now),
        (ComplaintStatus::Resolved, _) => Stamp::Clear,
        _ => Stamp::Keep,
    };

    Ok(ComplaintPatch {
        id: current.id.clone(),
        status: requested,
        resolved_at,
    })
}

// ---------------------------------------------------------------------------
// Visitors
// ---------------------------------------------------------------------------

/// Patch produced by a visitor gate action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorPatch {
    pub id: String,
    pub status: VisitorStatus,
    pub entry_time: Stamp,
    pub exit_time: Stamp,
    pub rejected_at: Stamp,
}

impl VisitorPatch {
    /// Active model carrying only the patched columns.
    #[must_use]
    pub fn into_active_model(self) -> visitor::ActiveModel {
        let mut model = visitor::ActiveModel {
            id: Unchanged(self.id),
            status: Set(self.status),
            ..Default::default()
        };
        self.entry_time.write(&mut model.entry_time);
        self.exit_time.write(&mut model.exit_time);
        self.rejected_at.write(&mut model.rejected_at);
        model
    }
}

/// Validates a visitor gate action expressed as the requested status:
/// `inside` grants entry, `exited` records the exit and `rejected` turns a
/// preapproved visitor away.
pub fn visitor_transition(
    current: &visitor::Model,
    requested: VisitorStatus,
    now: DateTime<Utc>,
) -> Result<VisitorPatch, TransitionError> {
    require_id(&current.id)?;

    let mut patch = VisitorPatch {
        id: current.id.clone(),
        status: requested,
        entry_time: Stamp::Keep,
        exit_time: Stamp::Keep,
        rejected_at: Stamp::Keep,
    };

    match (current.status, requested) {
        (VisitorStatus::Preapproved, VisitorStatus::Inside) => patch.entry_time = Stamp::Set(now),
        (VisitorStatus::Inside, VisitorStatus::Exited) => patch.exit_time = Stamp::Set(now),
        (VisitorStatus::Preapproved, VisitorStatus::Rejected) => {
            patch.rejected_at = Stamp::Set(now);
        }
        (from, to) => return Err(invalid("visitor", from, to)),
    }

    Ok(patch)
}

// ---------------------------------------------------------------------------
// Emergencies
// ---------------------------------------------------------------------------

/// Patch produced by resolving an emergency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyPatch {
    pub id: String,
    pub status: EmergencyStatus,
    pub resolved_at: Stamp,
    pub resolved_by: String,
}

impl EmergencyPatch {
    /// Active model carrying only the patched columns.
    #[must_use]
    pub fn into_active_model(self) -> emergency::ActiveModel {
        let mut model = emergency::ActiveModel {
            id: Unchanged(self.id),
            status: Set(self.status),
            resolved_by: Set(Some(self.resolved_by)),
            ..Default::default()
        };
        self.resolved_at.write(&mut model.resolved_at);
        model
    }
}

/// Validates an emergency status change. Only `active -> resolved` exists.
pub fn emergency_transition(
    current: &emergency::Model,
    requested: EmergencyStatus,
    resolved_by: &str,
    now: DateTime<Utc>,
) -> Result<EmergencyPatch, TransitionError> {
    require_id(&current.id)?;

    match (current.status, requested) {
        (EmergencyStatus::Active, EmergencyStatus::Resolved) => Ok(EmergencyPatch {
            id: current.id.clone(),
            status: EmergencyStatus::Resolved,
            resolved_at: Stamp::Set(now),
            resolved_by: resolved_by.to_string(),
        }),
        (from, to) => Err(invalid("emergency", from, to)),
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// Request to record a month as paid.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkPaid {
    pub user_id: String,
    /// `YYYY-MM`
    pub month: String,
    pub amount: f64,
    pub resident_name: String,
    pub apartment_number: String,
}

/// Builds the full payment document for a [`MarkPaid`] request.
///
/// Payments can be marked paid from any state, including when no record exists
/// yet. The name, apartment and amount are stored exactly as supplied.
pub fn mark_paid_transition(
    current: Option<&payment::Model>,
    request: &MarkPaid,
    due_day: u32,
    now: DateTime<Utc>,
) -> Result<payment::Model, TransitionError> {
    if request.user_id.trim().is_empty() {
        return Err(TransitionError::MissingField { field: "user_id" });
    }
    if !is_month_key(&request.month) {
        return Err(TransitionError::MissingField { field: "month" });
    }

    let id = crate::core::payment::payment_id(&request.user_id, &request.month);
    if let Some(existing) = current {
        if existing.id != id {
            return Err(invalid("payment", existing.id.as_str(), id));
        }
    }

    Ok(payment::Model {
        id,
        user_id: request.user_id.clone(),
        month: request.month.clone(),
        amount: request.amount,
        status: PaymentStatus::Paid,
        resident_name: request.resident_name.clone(),
        apartment_number: request.apartment_number.clone(),
        paid_at: Some(now),
        due_date: crate::core::payment::due_date(&request.month, due_day),
    })
}

/// Whether `month` is a `YYYY-MM` key.
#[must_use]
pub fn is_month_key(month: &str) -> bool {
    month.len() == 7
        && chrono::NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok()
}
