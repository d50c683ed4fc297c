//! Announcements posted by the administration.

use crate::{
    core::principal::{Principal, Role},
    entities::{Announcement, announcement},
    errors::{Error, Result},
    store::{Collection, Store},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Select, Set, prelude::*};
use tracing::info;
use uuid::Uuid;

/// Posts an announcement to every resident.
pub async fn post_announcement(
    store: &Store,
    principal: &Principal,
    title: &str,
    body: &str,
    urgent: bool,
) -> Result<announcement::Model> {
    principal.require(&[Role::Admin], "post announcements")?;
    if title.trim().is_empty() {
        return Err(Error::MissingField { field: "title" });
    }

    let notice = announcement::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(title.trim().to_string()),
        body: Set(body.to_string()),
        urgent: Set(urgent),
        posted_by: Set(principal.id.clone()),
        created_at: Set(Utc::now()),
    };

    let model = store.create(Collection::Announcements, notice).await?;
    info!(id = %model.id, urgent, "Announcement posted");
    Ok(model)
}

/// Announcements, newest first.
#[must_use]
pub fn latest_announcements() -> Select<Announcement> {
    Announcement::find().order_by_desc(announcement::Column::CreatedAt)
}
