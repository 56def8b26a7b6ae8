// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronization state for offline-first entities.
//!
//! SyncState describes durability only: whether the server is known to hold
//! a confirmed copy of an entity. It never affects whether the entity is
//! displayed; the local copy is always authoritative for presentation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Durability of a locally held entity with respect to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Created while offline; no sync attempt has been made yet.
    LocalOnly,
    /// Awaiting a sync attempt, or a previous attempt failed.
    Pending,
    /// The server holds a confirmed copy.
    Synced,
    /// Server and local copies diverge irreconcilably. Surfaced to the
    /// user, never auto-resolved.
    Conflict,
}

impl SyncState {
    /// Returns the string representation used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::LocalOnly => "local_only",
            SyncState::Pending => "pending",
            SyncState::Synced => "synced",
            SyncState::Conflict => "conflict",
        }
    }

    /// Initial state for a locally created entity, given current connectivity.
    pub fn for_new_local(connected: bool) -> Self {
        if connected {
            SyncState::Pending
        } else {
            SyncState::LocalOnly
        }
    }

    /// True if the sync scheduler should attempt to push this entity.
    pub fn needs_sync(&self) -> bool {
        matches!(self, SyncState::LocalOnly | SyncState::Pending)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local_only" => Ok(SyncState::LocalOnly),
            "pending" => Ok(SyncState::Pending),
            "synced" => Ok(SyncState::Synced),
            "conflict" => Ok(SyncState::Conflict),
            _ => Err(Error::InvalidSyncState(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
