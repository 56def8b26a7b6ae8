// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Chat message entity.
//!
//! Messages are the highest-volume synchronizable entity. They are created
//! locally first (optimistic UI), then pushed to the server over REST and
//! echoed back over the realtime channel; the [`ClientId`] keeps the two
//! arrival paths from materializing duplicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::identity::{ClientId, ServerId};
use crate::sync::SyncState;

/// Content shown in place of a soft-deleted message.
pub const DELETED_PLACEHOLDER: &str = "[message deleted]";

/// Classification of message content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Regular text message.
    Text,
    /// File attachment reference.
    File,
    /// Image attachment reference.
    Image,
    /// System-generated message (joins, renames, ...).
    System,
    /// Important announcement.
    Announcement,
}

impl MessageKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::File => "file",
            MessageKind::Image => "image",
            MessageKind::System => "system",
            MessageKind::Announcement => "announcement",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(MessageKind::Text),
            "file" => Ok(MessageKind::File),
            "image" => Ok(MessageKind::Image),
            "system" => Ok(MessageKind::System),
            "announcement" => Ok(MessageKind::Announcement),
            _ => Err(Error::InvalidMessageKind(s.to_string())),
        }
    }
}

/// A chat message as held in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Durable client-generated identifier, assigned once at creation.
    pub client_id: ClientId,
    /// Server identifier, known only after the remote accepts the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<ServerId>,
    /// Channel this message belongs to (server id of the channel).
    pub channel_id: ServerId,
    /// Sender's server user id.
    pub sender_id: ServerId,
    /// Sender's display name, denormalized for offline display.
    pub sender_name: String,
    /// Message body.
    pub content: String,
    /// Content classification.
    pub kind: MessageKind,
    /// Ordering timestamp.
    pub timestamp: DateTime<Utc>,
    /// True once the message has been edited.
    pub edited: bool,
    /// When the last edit happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    /// Soft-delete flag; the row is kept for the audit trail.
    pub deleted: bool,
    /// Synchronization durability.
    pub sync_state: SyncState,
    /// When the entity was last confirmed by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Composes a new locally authored message.
    ///
    /// The initial sync state follows current connectivity: `Pending` when
    /// a sync attempt can be made right away, `LocalOnly` otherwise.
    pub fn compose(
        channel_id: ServerId,
        sender_id: ServerId,
        sender_name: impl Into<String>,
        content: impl Into<String>,
        connected: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Message {
            client_id: ClientId::generate(),
            server_id: None,
            channel_id,
            sender_id,
            sender_name: sender_name.into(),
            content: content.into(),
            kind: MessageKind::Text,
            timestamp: now,
            edited: false,
            edited_at: None,
            deleted: false,
            sync_state: SyncState::for_new_local(connected),
            last_synced_at: None,
        }
    }

    /// Attaches the server id and promotes the message to `Synced`.
    pub fn mark_synced(&mut self, server_id: ServerId, now: DateTime<Utc>) {
        self.server_id = Some(server_id);
        self.sync_state = SyncState::Synced;
        self.last_synced_at = Some(now);
    }

    /// Replaces the body and flags the message as edited.
    pub fn edit(&mut self, content: impl Into<String>, now: DateTime<Utc>) {
        self.content = content.into();
        self.edited = true;
        self.edited_at = Some(now);
    }

    /// Soft-deletes the message: the row survives but the sensitive
    /// content is cleared.
    pub fn soft_delete(&mut self) {
        self.deleted = true;
        self.content = DELETED_PLACEHOLDER.to_string();
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
