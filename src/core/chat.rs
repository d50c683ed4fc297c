//! Community chat.
//!
//! Messages are appended and read back in order; there is no editing, deletion
//! or delivery tracking beyond what the store's subscriptions provide.

use crate::{
    core::principal::Principal,
    entities::{ChatMessage, chat_message},
    errors::{Error, Result},
    store::{Collection, Store},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Select, Set, prelude::*};
use tracing::debug;
use uuid::Uuid;

/// Appends a message from `principal`.
pub async fn send_message(
    store: &Store,
    principal: &Principal,
    text: &str,
) -> Result<chat_message::Model> {
    if text.trim().is_empty() {
        return Err(Error::MissingField { field: "text" });
    }

    let message = chat_message::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        sender_id: Set(principal.id.clone()),
        sender_role: Set(principal.role),
        text: Set(text.trim().to_string()),
        created_at: Set(Utc::now()),
    };

    let model = store.create(Collection::ChatMessages, message).await?;
    debug!(id = %model.id, sender = %model.sender_id, "Chat message sent");
    Ok(model)
}

/// The room history, oldest first.
#[must_use]
pub fn chat_history() -> Select<ChatMessage> {
    ChatMessage::find().order_by_asc(chat_message::Column::CreatedAt)
}

/// Messages from other members newer than `last_read_at`. With no read marker
/// every message from others is unread.
#[must_use]
pub fn unread_count(
    messages: &[chat_message::Model],
    last_read_at: Option<DateTime<Utc>>,
    reader_id: &str,
) -> usize {
    messages
        .iter()
        .filter(|m| m.sender_id != reader_id)
        .filter(|m| last_read_at.is_none_or(|read| m.created_at > read))
        .count()
}
