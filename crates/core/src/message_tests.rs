// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn sample(connected: bool) -> Message {
    Message::compose(7, 42, "Dana Vole", "hello", connected, Utc::now())
}

#[parameterized(
    text = { MessageKind::Text, "text" },
    file = { MessageKind::File, "file" },
    image = { MessageKind::Image, "image" },
    system = { MessageKind::System, "system" },
    announcement = { MessageKind::Announcement, "announcement" },
)]
fn kind_round_trips(kind: MessageKind, s: &str) {
    assert_eq!(kind.as_str(), s);
    assert_eq!(s.parse::<MessageKind>().unwrap(), kind);
}

#[test]
fn kind_rejects_unknown() {
    assert!("voice".parse::<MessageKind>().is_err());
}

#[test]
fn compose_picks_state_from_connectivity() {
    assert_eq!(sample(true).sync_state, SyncState::Pending);
    assert_eq!(sample(false).sync_state, SyncState::LocalOnly);
}

#[test]
fn compose_has_no_server_id() {
    let msg = sample(true);
    assert!(msg.server_id.is_none());
    assert!(msg.last_synced_at.is_none());
    assert!(!msg.deleted);
    assert!(!msg.edited);
}

#[test]
fn mark_synced_attaches_server_id() {
    let mut msg = sample(true);
    let now = Utc::now();
    msg.mark_synced(99, now);
    assert_eq!(msg.server_id, Some(99));
    assert_eq!(msg.sync_state, SyncState::Synced);
    assert_eq!(msg.last_synced_at, Some(now));
}

#[test]
fn edit_flags_and_timestamps() {
    let mut msg = sample(true);
    let now = Utc::now();
    msg.edit("hello again", now);
    assert_eq!(msg.content, "hello again");
    assert!(msg.edited);
    assert_eq!(msg.edited_at, Some(now));
}

#[test]
fn soft_delete_clears_content_but_keeps_identity() {
    let mut msg = sample(true);
    let id = msg.client_id;
    msg.soft_delete();
    assert!(msg.deleted);
    assert_eq!(msg.content, DELETED_PLACEHOLDER);
    assert_eq!(msg.client_id, id);
}
