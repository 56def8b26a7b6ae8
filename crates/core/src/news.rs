// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! News item entity.
//!
//! News items carry a visibility window: a publish time, an optional
//! expiry, and an optional scheduled-future time. Scheduled items exist
//! locally before they become visible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{ClientId, ServerId};
use crate::sync::SyncState;

/// A news item as held in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Durable client-generated identifier.
    pub client_id: ClientId,
    /// Server identifier, known once the remote accepts the item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<ServerId>,
    /// Headline shown in lists.
    pub headline: String,
    /// Full body.
    pub body: String,
    /// Free-form category label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Display name of the author.
    pub author: String,
    /// Start of the visibility window.
    pub published_at: DateTime<Utc>,
    /// Optional end of the visibility window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional future publication time; overrides `published_at` until
    /// reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Pinned items sort before unpinned ones.
    pub pinned: bool,
    /// Deactivated items are hidden regardless of window.
    pub active: bool,
    /// Synchronization durability.
    pub sync_state: SyncState,
    /// When the entity was last confirmed by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl NewsItem {
    /// Publishes a new locally authored item, visible immediately.
    pub fn publish(
        headline: impl Into<String>,
        body: impl Into<String>,
        category: Option<String>,
        author: impl Into<String>,
        connected: bool,
        now: DateTime<Utc>,
    ) -> Self {
        NewsItem {
            client_id: ClientId::generate(),
            server_id: None,
            headline: headline.into(),
            body: body.into(),
            category,
            author: author.into(),
            published_at: now,
            expires_at: None,
            scheduled_for: None,
            pinned: false,
            active: true,
            sync_state: SyncState::for_new_local(connected),
            last_synced_at: None,
        }
    }

    /// Schedules an item for future publication. Scheduled items are
    /// always created `LocalOnly`; the scheduler pushes them when their
    /// time comes or connectivity allows.
    pub fn schedule(
        headline: impl Into<String>,
        body: impl Into<String>,
        category: Option<String>,
        author: impl Into<String>,
        publish_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut item = NewsItem::publish(headline, body, category, author, false, now);
        item.published_at = publish_at;
        item.scheduled_for = Some(publish_at);
        item
    }

    /// Attaches the server id and promotes the item to `Synced`.
    pub fn mark_synced(&mut self, server_id: ServerId, now: DateTime<Utc>) {
        self.server_id = Some(server_id);
        self.sync_state = SyncState::Synced;
        self.last_synced_at = Some(now);
    }

    /// True while the item should appear in the news feed.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        if let Some(scheduled) = self.scheduled_for {
            if now < scheduled {
                return false;
            }
        }
        if now < self.published_at {
            return false;
        }
        match self.expires_at {
            Some(expiry) => now < expiry,
            None => true,
        }
    }
}

#[cfg(test)]
#[path = "news_tests.rs"]
mod tests;
