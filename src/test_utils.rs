//! Shared test utilities for `ResiHub`.
//!
//! Helpers for an in-memory store, principals for each role, documents created
//! through the real operations, and plain model builders for the pure
//! aggregation and lifecycle tests.

#![allow(clippy::expect_used)]

use crate::{
    core::{
        complaint::{NewComplaint, raise_complaint},
        emergency::{NewEmergency, raise_emergency},
        principal::{Principal, Role},
        resident::{NewResident, get_resident, register_resident},
        visitor::{NewVisitor, preapprove_visitor},
    },
    entities::{
        announcement,
        complaint::{self, ComplaintCategory, ComplaintStatus},
        emergency::{self, EmergencyStatus},
        fund_entry::{self, FundKind},
        resident,
        visitor::{self, VisitorKind, VisitorStatus},
    },
    errors::Result,
    store::Store,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{mpsc::UnboundedReceiver, watch};

/// How long a test waits for a live update before giving up.
const UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates a store over an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_store() -> Result<Store> {
    Store::connect("sqlite::memory:").await
}

/// Next value from a subscription callback channel, or `None` on timeout.
pub async fn recv_within<T>(rx: &mut UnboundedReceiver<T>) -> Option<T> {
    tokio::time::timeout(UPDATE_TIMEOUT, rx.recv())
        .await
        .ok()
        .flatten()
}

/// Waits until the derived value satisfies `predicate` and returns it.
///
/// # Panics
/// If no matching value arrives within the update timeout.
pub async fn wait_for<D, P>(rx: &mut watch::Receiver<D>, predicate: P) -> D
where
    D: Clone,
    P: FnMut(&D) -> bool,
{
    tokio::time::timeout(UPDATE_TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("derived value did not reach the expected state in time")
        .expect("derived channel closed")
        .clone()
}

/// Admin principal without a stored profile.
pub fn admin_principal() -> Principal {
    Principal::new("admin-1", Role::Admin)
}

/// Security principal without a stored profile.
pub fn security_principal() -> Principal {
    Principal::new("guard-1", Role::Security)
}

/// Registers a resident and returns their principal.
pub async fn resident_principal(store: &Store, name: &str, apartment: &str) -> Result<Principal> {
    let profile = create_test_resident(store, name, apartment).await?;
    Ok(Principal::new(profile.id, profile.role))
}

/// Registers a resident with sensible defaults.
///
/// # Defaults
/// * `email`: derived from the name
/// * `phone`: None
pub async fn create_test_resident(
    store: &Store,
    name: &str,
    apartment: &str,
) -> Result<resident::Model> {
    register_resident(
        store,
        NewResident {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: Role::Resident,
            apartment_number: apartment.to_string(),
            phone: None,
        },
    )
    .await
}

/// Registers a staff account (admin or security) with no apartment.
pub async fn create_test_staff(store: &Store, name: &str, role: Role) -> Result<resident::Model> {
    register_resident(
        store,
        NewResident {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role,
            apartment_number: String::new(),
            phone: None,
        },
    )
    .await
}

/// Apartment on file for `principal`, or a placeholder for accounts without one.
async fn apartment_of(store: &Store, principal: &Principal) -> Result<String> {
    Ok(get_resident(store, &principal.id)
        .await?
        .map_or_else(|| "A-101".to_string(), |p| p.apartment_number))
}

/// Raises a plumbing complaint from `principal`'s apartment.
pub async fn create_test_complaint(
    store: &Store,
    principal: &Principal,
    title: &str,
) -> Result<complaint::Model> {
    let apartment_number = apartment_of(store, principal).await?;
    raise_complaint(
        store,
        principal,
        NewComplaint {
            title: title.to_string(),
            description: format!("{title} needs attention"),
            category: ComplaintCategory::Plumbing,
            apartment_number,
            image_url: None,
        },
    )
    .await
}

/// Preapproves a visitor for `principal`'s apartment.
pub async fn create_test_visitor(
    store: &Store,
    principal: &Principal,
    name: &str,
) -> Result<visitor::Model> {
    let apartment_number = apartment_of(store, principal).await?;
    preapprove_visitor(
        store,
        principal,
        NewVisitor {
            name: name.to_string(),
            phone: "9000000000".to_string(),
            apartment_number,
        },
    )
    .await
}

/// Raises an emergency of `kind` with high urgency.
pub async fn create_test_emergency(
    store: &Store,
    principal: &Principal,
    kind: &str,
) -> Result<emergency::Model> {
    raise_emergency(
        store,
        principal,
        NewEmergency {
            kind: kind.to_string(),
            description: format!("{kind} reported"),
            urgency: Some("high".to_string()),
        },
    )
    .await
}

/// UTC timestamp from calendar parts.
pub fn ts(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid test timestamp")
}

/// Complaint model built in memory, created 2024-03-01 08:00.
pub fn sample_complaint(id: &str, status: ComplaintStatus) -> complaint::Model {
    complaint::Model {
        id: id.to_string(),
        title: "Leaking tap".to_string(),
        description: "Kitchen tap drips".to_string(),
        category: ComplaintCategory::Plumbing,
        raised_by: "res-0".to_string(),
        apartment_number: "A-101".to_string(),
        image_url: None,
        status,
        created_at: ts(2024, 3, 1, 8, 0),
        resolved_at: None,
    }
}

/// Visitor model built in memory with no timestamps stamped yet.
pub fn sample_visitor(id: &str, status: VisitorStatus) -> visitor::Model {
    visitor::Model {
        id: id.to_string(),
        name: "Courier".to_string(),
        phone: "9000000000".to_string(),
        apartment_number: "A-101".to_string(),
        kind: VisitorKind::Preapproved,
        status,
        created_by: "res-0".to_string(),
        entry_time: None,
        exit_time: None,
        rejected_at: None,
        created_at: ts(2024, 3, 1, 8, 0),
    }
}

/// Emergency model built in memory, raised by a resident.
pub fn sample_emergency(id: &str, status: EmergencyStatus) -> emergency::Model {
    emergency::Model {
        id: id.to_string(),
        kind: "Fire".to_string(),
        description: "Smoke in the stairwell".to_string(),
        raised_by: "res-0".to_string(),
        raised_by_role: Role::Resident,
        urgency: Some("high".to_string()),
        status,
        created_at: ts(2024, 3, 1, 8, 0),
        resolved_at: None,
        resolved_by: None,
    }
}

/// Announcement model built in memory.
pub fn sample_announcement(id: &str) -> announcement::Model {
    announcement::Model {
        id: id.to_string(),
        title: "Water outage".to_string(),
        body: "Tanks are cleaned on Sunday".to_string(),
        urgent: false,
        posted_by: "admin-1".to_string(),
        created_at: ts(2024, 3, 1, 8, 0),
    }
}

/// Fund ledger line with a raw stored amount.
pub fn fund_line(kind: FundKind, amount: Value, month: Option<&str>) -> fund_entry::Model {
    fund_entry::Model {
        id: uuid::Uuid::new_v4().to_string(),
        kind,
        amount,
        description: format!("{kind} line"),
        month: month.map(str::to_string),
        created_by: "admin-1".to_string(),
        created_at: ts(2024, 3, 1, 8, 0),
    }
}
