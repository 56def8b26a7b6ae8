// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::alert::{AlertKind, AlertLevel};
use chrono::Duration;
use tempfile::tempdir;

fn store() -> Store {
    Store::open_in_memory().unwrap()
}

fn message_in(store: &Store, channel_id: ServerId, content: &str) -> Message {
    let msg = Message::compose(channel_id, 3, "Dana Vole", content, false, Utc::now());
    store.upsert_message(&msg).unwrap();
    msg
}

#[test]
fn open_creates_file_and_is_reopenable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("carrier.db");
    {
        let s = Store::open(&path).unwrap();
        message_in(&s, 7, "persisted");
    }
    let s = Store::open(&path).unwrap();
    assert_eq!(s.channel_messages(7).unwrap().len(), 1);
}

#[test]
fn migrations_are_idempotent() {
    let s = store();
    run_migrations(&s.conn).unwrap();
    run_migrations(&s.conn).unwrap();
}

#[test]
fn upsert_message_is_create_or_update_by_client_id() {
    let s = store();
    let mut msg = message_in(&s, 7, "first");

    msg.content = "second".into();
    msg.server_id = Some(42);
    s.upsert_message(&msg).unwrap();

    let stored = s.message(&msg.client_id).unwrap().unwrap();
    assert_eq!(stored.content, "second");
    assert_eq!(stored.server_id, Some(42));
    assert_eq!(s.channel_messages(7).unwrap().len(), 1);
}

#[test]
fn message_lookup_by_server_id() {
    let s = store();
    let mut msg = message_in(&s, 7, "hello");
    msg.mark_synced(42, Utc::now());
    s.upsert_message(&msg).unwrap();

    let found = s.message_by_server_id(42).unwrap().unwrap();
    assert_eq!(found.client_id, msg.client_id);
    assert!(s.message_by_server_id(999).unwrap().is_none());
}

#[test]
fn channel_messages_are_ordered_by_timestamp() {
    let s = store();
    let base = Utc::now();
    for (i, text) in ["one", "two", "three"].iter().enumerate() {
        let mut msg = Message::compose(7, 3, "Dana", *text, false, base);
        msg.timestamp = base + Duration::seconds(i as i64);
        s.upsert_message(&msg).unwrap();
    }
    let other = Message::compose(8, 3, "Dana", "elsewhere", false, base);
    s.upsert_message(&other).unwrap();

    let messages = s.channel_messages(7).unwrap();
    let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
}

#[test]
fn needing_sync_scan_is_in_creation_order_and_skips_synced() {
    let s = store();
    let first = message_in(&s, 7, "first");
    let mut second = message_in(&s, 7, "second");
    let third = message_in(&s, 7, "third");

    second.mark_synced(42, Utc::now());
    s.upsert_message(&second).unwrap();

    let pending = s.messages_needing_sync().unwrap();
    let ids: Vec<_> = pending.iter().map(|m| m.client_id).collect();
    assert_eq!(ids, vec![first.client_id, third.client_id]);
}

#[test]
fn promote_message_is_guarded_and_idempotent() {
    let s = store();
    let msg = message_in(&s, 7, "hello");
    let now = Utc::now();

    assert!(s.promote_message(&msg.client_id, 42, now).unwrap());
    // A second promotion is a no-op.
    assert!(!s.promote_message(&msg.client_id, 42, now).unwrap());

    let stored = s.message(&msg.client_id).unwrap().unwrap();
    assert_eq!(stored.server_id, Some(42));
    assert_eq!(stored.sync_state, SyncState::Synced);
    assert!(stored.last_synced_at.is_some());
}

#[test]
fn mark_message_pending_only_touches_local_only() {
    let s = store();
    let msg = message_in(&s, 7, "hello");
    s.mark_message_pending(&msg.client_id).unwrap();
    assert_eq!(
        s.message(&msg.client_id).unwrap().unwrap().sync_state,
        SyncState::Pending
    );

    s.promote_message(&msg.client_id, 42, Utc::now()).unwrap();
    s.mark_message_pending(&msg.client_id).unwrap();
    assert_eq!(
        s.message(&msg.client_id).unwrap().unwrap().sync_state,
        SyncState::Synced
    );
}

#[test]
fn merge_remote_channel_keeps_existing_client_id() {
    let s = store();
    let mut local = Channel::create("general", None, true, Utc::now());
    local.mark_synced(7, Utc::now());
    s.upsert_channel(&local).unwrap();

    let mut incoming = Channel::create("general (renamed)", None, true, Utc::now());
    incoming.server_id = Some(7);
    let merged = s.merge_remote_channel(&incoming).unwrap();

    assert_eq!(merged.client_id, local.client_id);
    assert_eq!(s.list_channels().unwrap().len(), 1);
    assert_eq!(s.list_channels().unwrap()[0].name, "general (renamed)");
}

#[test]
fn merge_remote_channel_requires_server_id() {
    let s = store();
    let incoming = Channel::create("general", None, true, Utc::now());
    assert!(s.merge_remote_channel(&incoming).is_err());
}

#[test]
fn unread_counters_follow_message_flow() {
    let s = store();
    let mut channel = Channel::create("general", None, true, Utc::now());
    channel.mark_synced(7, Utc::now());
    s.upsert_channel(&channel).unwrap();

    s.note_channel_message(7, Utc::now(), false).unwrap();
    s.note_channel_message(7, Utc::now(), false).unwrap();
    s.note_channel_message(7, Utc::now(), true).unwrap();

    let stored = s.channel_by_server_id(7).unwrap().unwrap();
    assert_eq!(stored.unread_count, 2);
    assert_eq!(stored.message_count, 3);

    s.mark_channel_read(7).unwrap();
    let stored = s.channel_by_server_id(7).unwrap().unwrap();
    assert_eq!(stored.unread_count, 0);
}

#[test]
fn active_alerts_excludes_expired_and_cancelled() {
    let s = store();
    let now = Utc::now();

    let live = Alert::raise(
        "Lockdown",
        "Remain in place",
        None,
        AlertLevel::Emergency,
        AlertKind::Lockdown,
        "Front Office",
        true,
        now,
    );
    s.upsert_alert(&live).unwrap();

    let mut expired = live.clone();
    expired.client_id = ClientId::generate();
    expired.expires_at = now - Duration::hours(1);
    s.upsert_alert(&expired).unwrap();

    let mut cancelled = live.clone();
    cancelled.client_id = ClientId::generate();
    cancelled.cancel(now);
    s.upsert_alert(&cancelled).unwrap();

    let active = s.active_alerts(now).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].client_id, live.client_id);
}

#[test]
fn promote_alert_is_guarded() {
    let s = store();
    let alert = Alert::raise(
        "Drill",
        "Fire drill at ten",
        None,
        AlertLevel::Normal,
        AlertKind::Announcement,
        "Front Office",
        true,
        Utc::now(),
    );
    s.upsert_alert(&alert).unwrap();

    assert!(s.promote_alert(&alert.client_id, 9, Utc::now()).unwrap());
    assert!(!s.promote_alert(&alert.client_id, 9, Utc::now()).unwrap());
}

#[test]
fn visible_news_honors_window_and_pinning() {
    let s = store();
    let now = Utc::now();

    let mut pinned = NewsItem::publish("Pinned", "body", None, "J. Ames", true, now);
    pinned.pinned = true;
    s.upsert_news(&pinned).unwrap();

    let plain = NewsItem::publish("Plain", "body", None, "J. Ames", true, now);
    s.upsert_news(&plain).unwrap();

    let scheduled = NewsItem::schedule(
        "Later",
        "body",
        None,
        "J. Ames",
        now + Duration::hours(2),
        now,
    );
    s.upsert_news(&scheduled).unwrap();

    let mut inactive = NewsItem::publish("Hidden", "body", None, "J. Ames", true, now);
    inactive.active = false;
    s.upsert_news(&inactive).unwrap();

    let visible = s.visible_news(now).unwrap();
    let headlines: Vec<_> = visible.iter().map(|n| n.headline.as_str()).collect();
    assert_eq!(headlines, vec!["Pinned", "Plain"]);

    // The scheduled item appears once its time has come.
    let later = s.visible_news(now + Duration::hours(3)).unwrap();
    assert!(later.iter().any(|n| n.headline == "Later"));
}

#[test]
fn news_needing_sync_holds_back_unreached_schedules() {
    let s = store();
    let now = Utc::now();

    let due = NewsItem::publish("Due", "body", None, "J. Ames", false, now);
    s.upsert_news(&due).unwrap();

    let not_due = NewsItem::schedule("Not due", "body", None, "J. Ames", now + Duration::hours(2), now);
    s.upsert_news(&not_due).unwrap();

    let pending = s.news_needing_sync(now).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].headline, "Due");

    let pending = s.news_needing_sync(now + Duration::hours(3)).unwrap();
    assert_eq!(pending.len(), 2);
}

#[test]
fn session_round_trips_and_is_single_row() {
    let s = store();
    assert!(s.load_session().unwrap().is_none());

    let now = Utc::now();
    let first = Session::offline("dvole", "https://talk.example.org");
    s.save_session(&first).unwrap();

    let second = Session::authenticated(
        3,
        "dvole",
        "Dana Vole",
        "tok-123",
        "https://talk.example.org",
        Some(now + Duration::hours(8)),
        now,
    );
    s.save_session(&second).unwrap();

    let loaded = s.load_session().unwrap().unwrap();
    assert_eq!(loaded.user_id, Some(3));
    assert_eq!(loaded.token.as_deref(), Some("tok-123"));
    assert_eq!(loaded.mode, ConnectionMode::Connected);
}

#[test]
fn session_mode_update_touches_last_connected_only_when_connecting() {
    let s = store();
    let session = Session::offline("dvole", "https://talk.example.org");
    s.save_session(&session).unwrap();

    s.update_session_mode(ConnectionMode::Disconnected, Utc::now())
        .unwrap();
    let loaded = s.load_session().unwrap().unwrap();
    assert_eq!(loaded.mode, ConnectionMode::Disconnected);
    assert!(loaded.last_connected.is_none());

    s.update_session_mode(ConnectionMode::Connected, Utc::now())
        .unwrap();
    let loaded = s.load_session().unwrap().unwrap();
    assert_eq!(loaded.mode, ConnectionMode::Connected);
    assert!(loaded.last_connected.is_some());
}

#[test]
fn clear_session_removes_the_row() {
    let s = store();
    s.save_session(&Session::offline("dvole", "https://x"))
        .unwrap();
    s.clear_session().unwrap();
    assert!(s.load_session().unwrap().is_none());
}
