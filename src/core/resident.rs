//! Resident profile operations.
//!
//! Profiles are the canonical record behind a [`Principal`]; the payment roster
//! and [`MarkPaid::from_profile`](crate::core::lifecycle::MarkPaid::from_profile)
//! read names and apartment numbers from here.

use crate::{
    core::principal::{Principal, Role},
    entities::{Resident, resident},
    errors::{Error, Result},
    store::{Collection, Store},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Select, Set, prelude::*};
use tracing::info;
use uuid::Uuid;

/// Input for [`register_resident`].
#[derive(Debug, Clone)]
pub struct NewResident {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub apartment_number: String,
    pub phone: Option<String>,
}

/// Creates a profile for a newly signed-up account.
///
/// Residents must have an apartment number; staff accounts may leave it empty.
pub async fn register_resident(store: &Store, input: NewResident) -> Result<resident::Model> {
    if input.name.trim().is_empty() {
        return Err(Error::MissingField { field: "name" });
    }
    if input.role == Role::Resident && input.apartment_number.trim().is_empty() {
        return Err(Error::MissingField {
            field: "apartment_number",
        });
    }

    let profile = resident::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(input.name.trim().to_string()),
        email: Set(input.email.trim().to_string()),
        role: Set(input.role),
        apartment_number: Set(input.apartment_number.trim().to_string()),
        phone: Set(input.phone),
        created_at: Set(Utc::now()),
    };

    let model = store.create(Collection::Residents, profile).await?;
    info!(id = %model.id, role = %model.role, "Registered account");
    Ok(model)
}

/// Finds a profile by account id.
pub async fn get_resident(store: &Store, id: &str) -> Result<Option<resident::Model>> {
    Resident::find_by_id(id.to_string())
        .one(store.connection())
        .await
        .map_err(Into::into)
}

/// Resolves the principal for an account id.
pub async fn principal_for(store: &Store, id: &str) -> Result<Principal> {
    get_resident(store, id)
        .await?
        .map(|profile| Principal::new(profile.id, profile.role))
        .ok_or_else(|| Error::NotFound {
            collection: Collection::Residents,
            id: id.to_string(),
        })
}

/// Every resident-role account, ordered by apartment.
#[must_use]
pub fn residents_query() -> Select<Resident> {
    Resident::find()
        .filter(resident::Column::Role.eq(Role::Resident))
        .order_by_asc(resident::Column::ApartmentNumber)
}
