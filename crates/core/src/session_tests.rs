// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::Duration;
use yare::parameterized;

#[parameterized(
    connected = { ConnectionMode::Connected, "connected", true },
    offline = { ConnectionMode::Offline, "offline", false },
    syncing = { ConnectionMode::Syncing, "syncing", true },
    disconnected = { ConnectionMode::Disconnected, "disconnected", false },
)]
fn mode_round_trips(mode: ConnectionMode, s: &str, online: bool) {
    assert_eq!(mode.as_str(), s);
    assert_eq!(s.parse::<ConnectionMode>().unwrap(), mode);
    assert_eq!(mode.is_online(), online);
}

#[test]
fn authenticated_session_is_valid_until_expiry() {
    let now = Utc::now();
    let session = Session::authenticated(
        3,
        "dvole",
        "Dana Vole",
        "tok-123",
        "https://talk.example.org",
        Some(now + Duration::hours(8)),
        now,
    );
    assert!(session.is_valid(now));
    assert!(!session.is_valid(now + Duration::hours(9)));
}

#[test]
fn token_without_expiry_stays_valid() {
    let now = Utc::now();
    let session =
        Session::authenticated(3, "dvole", "Dana Vole", "tok-123", "https://x", None, now);
    assert!(session.is_valid(now + Duration::days(365)));
}

#[test]
fn offline_session_has_no_token() {
    let session = Session::offline("dvole", "https://talk.example.org");
    assert!(session.token.is_none());
    assert_eq!(session.mode, ConnectionMode::Offline);
    assert!(!session.is_valid(Utc::now()));
}
