// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    public = { ChannelKind::Public, "public" },
    private = { ChannelKind::Private, "private" },
    direct = { ChannelKind::Direct, "direct" },
    announcement = { ChannelKind::Announcement, "announcement" },
)]
fn kind_round_trips(kind: ChannelKind, s: &str) {
    assert_eq!(kind.as_str(), s);
    assert_eq!(s.parse::<ChannelKind>().unwrap(), kind);
}

#[test]
fn create_offline_is_local_only() {
    let channel = Channel::create("general", None, false, Utc::now());
    assert_eq!(channel.sync_state, SyncState::LocalOnly);
    assert!(channel.server_id.is_none());
}

#[test]
fn note_message_counts_unread_for_remote_senders() {
    let mut channel = Channel::create("general", None, true, Utc::now());
    channel.note_message(Utc::now(), false);
    channel.note_message(Utc::now(), false);
    channel.note_message(Utc::now(), true);
    assert_eq!(channel.message_count, 3);
    assert_eq!(channel.unread_count, 2);
}

#[test]
fn mark_read_clears_unread() {
    let mut channel = Channel::create("general", None, true, Utc::now());
    channel.note_message(Utc::now(), false);
    channel.mark_read();
    assert_eq!(channel.unread_count, 0);
    assert_eq!(channel.message_count, 1);
}

#[test]
fn mark_synced_promotes() {
    let mut channel = Channel::create("general", None, true, Utc::now());
    channel.mark_synced(5, Utc::now());
    assert_eq!(channel.server_id, Some(5));
    assert_eq!(channel.sync_state, SyncState::Synced);
}
