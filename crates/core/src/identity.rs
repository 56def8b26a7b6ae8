// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable identity for synchronizable entities.
//!
//! Every synchronizable entity carries a pair of identifiers:
//!
//! - A [`ClientId`], generated locally exactly once at creation time and
//!   immutable for the entity's lifetime. It is the sole deduplication key
//!   across the realtime channel and the REST channel.
//! - An optional [`ServerId`], assigned by the server once it accepts the
//!   entity. The server id must never be used for deduplication before it
//!   is known: a concurrent local create and a realtime echo of the same
//!   item would otherwise race and produce duplicates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Server-assigned identifier, known only after the remote accepts an entity.
pub type ServerId = i64;

/// Client-generated durable identifier (random UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Generates a fresh client id.
    pub fn generate() -> Self {
        ClientId(Uuid::new_v4())
    }

    /// Returns the canonical string form used in storage and on the wire.
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Uuid::parse_str(s)
            .map(ClientId)
            .map_err(|_| Error::InvalidClientId(s.to_string()))
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
