// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Emergency alert entity.
//!
//! Alerts are the one entity class where duplicate materialization has a
//! user-audible consequence: an alert arriving via both the REST bootstrap
//! and a realtime push must sound exactly once. Reconciliation therefore
//! dedups by [`ClientId`] before any side effect fires.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::identity::{ClientId, ServerId};
use crate::sync::SyncState;

/// Alert priority levels, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// Lockdown, fire and similar; audible, red.
    Emergency,
    /// High priority, audible.
    Urgent,
    /// Important notice requiring attention.
    High,
    /// Regular announcement.
    Normal,
    /// Informational only.
    Low,
}

impl AlertLevel {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Emergency => "emergency",
            AlertLevel::Urgent => "urgent",
            AlertLevel::High => "high",
            AlertLevel::Normal => "normal",
            AlertLevel::Low => "low",
        }
    }

    /// Default lifetime of an alert at this level.
    pub fn default_lifetime(&self) -> Duration {
        match self {
            AlertLevel::Emergency => Duration::hours(4),
            AlertLevel::Urgent => Duration::hours(2),
            AlertLevel::High => Duration::hours(8),
            AlertLevel::Normal | AlertLevel::Low => Duration::hours(24),
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "emergency" => Ok(AlertLevel::Emergency),
            "urgent" => Ok(AlertLevel::Urgent),
            "high" => Ok(AlertLevel::High),
            "normal" => Ok(AlertLevel::Normal),
            "low" => Ok(AlertLevel::Low),
            _ => Err(Error::InvalidAlertLevel(s.to_string())),
        }
    }
}

/// Categories of alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Lockdown,
    Fire,
    Weather,
    Medical,
    Evacuation,
    Shelter,
    AllClear,
    Announcement,
    ScheduleChange,
    Custom,
}

impl AlertKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Lockdown => "lockdown",
            AlertKind::Fire => "fire",
            AlertKind::Weather => "weather",
            AlertKind::Medical => "medical",
            AlertKind::Evacuation => "evacuation",
            AlertKind::Shelter => "shelter",
            AlertKind::AllClear => "all_clear",
            AlertKind::Announcement => "announcement",
            AlertKind::ScheduleChange => "schedule_change",
            AlertKind::Custom => "custom",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lockdown" => Ok(AlertKind::Lockdown),
            "fire" => Ok(AlertKind::Fire),
            "weather" => Ok(AlertKind::Weather),
            "medical" => Ok(AlertKind::Medical),
            "evacuation" => Ok(AlertKind::Evacuation),
            "shelter" => Ok(AlertKind::Shelter),
            "all_clear" => Ok(AlertKind::AllClear),
            "announcement" => Ok(AlertKind::Announcement),
            "schedule_change" => Ok(AlertKind::ScheduleChange),
            "custom" => Ok(AlertKind::Custom),
            _ => Err(Error::InvalidAlertKind(s.to_string())),
        }
    }
}

/// An emergency alert as held in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Durable client-generated identifier.
    pub client_id: ClientId,
    /// Server identifier, known once the remote accepts the alert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<ServerId>,
    /// Short title.
    pub title: String,
    /// Alert body.
    pub body: String,
    /// Optional instructions for recipients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Priority level.
    pub level: AlertLevel,
    /// Category.
    pub kind: AlertKind,
    /// Display name of the issuer.
    pub issued_by: String,
    /// When the alert was issued.
    pub issued_at: DateTime<Utc>,
    /// When the alert stops being active.
    pub expires_at: DateTime<Utc>,
    /// True once the local user acknowledged the alert.
    pub acknowledged: bool,
    /// When the acknowledgment happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// Set when the alert was cancelled before expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    /// True if the alert demands an explicit acknowledgment.
    pub requires_ack: bool,
    /// True if receiving this alert should play a sound.
    pub audible: bool,
    /// Synchronization durability.
    pub sync_state: SyncState,
    /// When the entity was last confirmed by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Raises a new locally issued alert with the level's default expiry.
    #[allow(clippy::too_many_arguments)]
    pub fn raise(
        title: impl Into<String>,
        body: impl Into<String>,
        instructions: Option<String>,
        level: AlertLevel,
        kind: AlertKind,
        issued_by: impl Into<String>,
        connected: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Alert {
            client_id: ClientId::generate(),
            server_id: None,
            title: title.into(),
            body: body.into(),
            instructions,
            level,
            kind,
            issued_by: issued_by.into(),
            issued_at: now,
            expires_at: now + level.default_lifetime(),
            acknowledged: false,
            acknowledged_at: None,
            cancelled_at: None,
            requires_ack: level == AlertLevel::Emergency,
            audible: matches!(
                level,
                AlertLevel::Emergency | AlertLevel::Urgent | AlertLevel::High
            ),
            sync_state: SyncState::for_new_local(connected),
            last_synced_at: None,
        }
    }

    /// Attaches the server id and promotes the alert to `Synced`.
    pub fn mark_synced(&mut self, server_id: ServerId, now: DateTime<Utc>) {
        self.server_id = Some(server_id);
        self.sync_state = SyncState::Synced;
        self.last_synced_at = Some(now);
    }

    /// Records the local user's acknowledgment.
    pub fn acknowledge(&mut self, now: DateTime<Utc>) {
        self.acknowledged = true;
        self.acknowledged_at = Some(now);
    }

    /// Cancels the alert before expiry.
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.cancelled_at = Some(now);
    }

    /// True if the alert has passed its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True while the alert should be shown in the active list.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.cancelled_at.is_none() && !self.is_expired(now)
    }
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
