// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Communication channel entity.
//!
//! Channels are server-id-primary: they are rarely created offline, and
//! membership, unread counters and message lists all key off the server
//! id. A locally created channel still receives a [`ClientId`] so the
//! create can be deduplicated like any other entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::identity::{ClientId, ServerId};
use crate::sync::SyncState;

/// Types of communication channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Open to all users.
    Public,
    /// Invite-only.
    Private,
    /// One-on-one conversation.
    Direct,
    /// Read-only announcements channel.
    Announcement,
}

impl ChannelKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Public => "public",
            ChannelKind::Private => "private",
            ChannelKind::Direct => "direct",
            ChannelKind::Announcement => "announcement",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(ChannelKind::Public),
            "private" => Ok(ChannelKind::Private),
            "direct" => Ok(ChannelKind::Direct),
            "announcement" => Ok(ChannelKind::Announcement),
            _ => Err(Error::InvalidChannelKind(s.to_string())),
        }
    }
}

/// A channel as held in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Durable client-generated identifier.
    pub client_id: ClientId,
    /// Server identifier; channels created by the server carry it from
    /// the start, locally created ones gain it on first sync.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<ServerId>,
    /// Channel name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Channel classification.
    pub kind: ChannelKind,
    /// Number of messages not yet read by the local user.
    pub unread_count: i64,
    /// Timestamp of the most recent message, for ordering channel lists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
    /// Total message count as last reported by the server.
    pub message_count: i64,
    /// True if the channel has been archived.
    pub archived: bool,
    /// When the channel was created.
    pub created_at: DateTime<Utc>,
    /// Synchronization durability.
    pub sync_state: SyncState,
    /// When the entity was last confirmed by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Channel {
    /// Creates a new locally authored channel.
    pub fn create(
        name: impl Into<String>,
        description: Option<String>,
        connected: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Channel {
            client_id: ClientId::generate(),
            server_id: None,
            name: name.into(),
            description,
            kind: ChannelKind::Public,
            unread_count: 0,
            last_message_at: None,
            message_count: 0,
            archived: false,
            created_at: now,
            sync_state: SyncState::for_new_local(connected),
            last_synced_at: None,
        }
    }

    /// Attaches the server id and promotes the channel to `Synced`.
    pub fn mark_synced(&mut self, server_id: ServerId, now: DateTime<Utc>) {
        self.server_id = Some(server_id);
        self.sync_state = SyncState::Synced;
        self.last_synced_at = Some(now);
    }

    /// Records one more message in this channel.
    pub fn note_message(&mut self, at: DateTime<Utc>, from_local_user: bool) {
        self.message_count += 1;
        self.last_message_at = Some(at);
        if !from_local_user {
            self.unread_count += 1;
        }
    }

    /// Clears the unread counter (local user caught up).
    pub fn mark_read(&mut self) {
        self.unread_count = 0;
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
