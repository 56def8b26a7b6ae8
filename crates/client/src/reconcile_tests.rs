// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the reconciliation engine.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::test_helpers::{alert_wire, channel_wire, drain_notices, message_wire, test_engine};
use carrier_core::MessageKind;

#[tokio::test]
async fn optimistic_visibility_before_any_network() {
    let engine = test_engine(false).await;
    let mut notices = engine.reconciler.subscribe();

    let message = engine.reconciler.send_message(7, "hello").await.unwrap();

    assert_eq!(message.sync_state, SyncState::LocalOnly);
    assert!(message.server_id.is_none());

    // Visible in the store and on the notice stream without any remote
    // call having happened.
    let notices = drain_notices(&mut notices);
    assert!(notices
        .iter()
        .any(|n| matches!(n, Notice::MessageUpserted(m) if m.client_id == message.client_id)));
    assert_eq!(engine.remote.create_message_calls(), 0);

    let store = engine.reconciler.store().lock().await;
    assert_eq!(store.channel_messages(7).unwrap().len(), 1);
}

#[tokio::test]
async fn online_create_promotes_with_server_id() {
    let engine = test_engine(true).await;

    let message = engine.reconciler.send_message(7, "hello").await.unwrap();

    assert_eq!(message.sync_state, SyncState::Synced);
    assert_eq!(message.server_id, Some(1));
    assert!(message.last_synced_at.is_some());
    assert_eq!(engine.remote.create_message_calls(), 1);
}

#[tokio::test]
async fn remote_failure_leaves_message_pending_without_error() {
    let engine = test_engine(true).await;
    engine.remote.fail_creates(true);

    let message = engine.reconciler.send_message(7, "hello").await.unwrap();

    assert_eq!(message.sync_state, SyncState::Pending);
    let store = engine.reconciler.store().lock().await;
    let stored = store.message(&message.client_id).unwrap().unwrap();
    assert_eq!(stored.sync_state, SyncState::Pending);
    assert!(stored.server_id.is_none());
}

#[tokio::test]
async fn realtime_echo_merges_into_existing_row() {
    let engine = test_engine(false).await;
    let message = engine.reconciler.send_message(7, "hello").await.unwrap();

    // The echo of our own message arrives with the server id attached.
    let echo = message_wire(message.client_id, Some(42), 7, 3, "hello");
    engine.reconciler.apply_remote_message(echo).await.unwrap();

    let store = engine.reconciler.store().lock().await;
    let rows = store.channel_messages(7).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].server_id, Some(42));
    assert_eq!(rows[0].sync_state, SyncState::Synced);
}

#[tokio::test]
async fn duplicate_delivery_via_rest_then_echo_keeps_one_row() {
    let engine = test_engine(true).await;
    let message = engine.reconciler.send_message(7, "hello").await.unwrap();
    assert_eq!(message.server_id, Some(1));

    let echo = message_wire(message.client_id, Some(1), 7, 3, "hello");
    engine.reconciler.apply_remote_message(echo).await.unwrap();

    let store = engine.reconciler.store().lock().await;
    assert_eq!(store.channel_messages(7).unwrap().len(), 1);
}

#[tokio::test]
async fn applying_n_events_is_idempotent_with_last_writer_fields() {
    let engine = test_engine(false).await;
    let client_id = ClientId::generate();

    for content in ["one", "two", "three"] {
        let wire = message_wire(client_id, Some(9), 7, 99, content);
        engine.reconciler.apply_remote_message(wire).await.unwrap();
    }

    let store = engine.reconciler.store().lock().await;
    let rows = store.channel_messages(7).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].content, "three");
    assert_eq!(rows[0].kind, MessageKind::Text);
}

#[tokio::test]
async fn wire_without_client_id_is_a_structural_error() {
    let engine = test_engine(false).await;
    let mut wire = message_wire(ClientId::generate(), Some(9), 7, 99, "anon");
    wire.client_id = None;

    let err = engine.reconciler.apply_remote_message(wire).await;
    assert!(err.is_err());

    let store = engine.reconciler.store().lock().await;
    assert!(store.channel_messages(7).unwrap().is_empty());
}

#[tokio::test]
async fn remote_message_bumps_unread_only_on_first_materialization() {
    let engine = test_engine(true).await;
    let channel = engine
        .reconciler
        .create_channel("general", None)
        .await
        .unwrap();
    let channel_id = channel.server_id.unwrap();

    let wire = message_wire(ClientId::generate(), Some(5), channel_id, 99, "hi");
    engine
        .reconciler
        .apply_remote_message(wire.clone())
        .await
        .unwrap();
    engine.reconciler.apply_remote_message(wire).await.unwrap();

    let store = engine.reconciler.store().lock().await;
    let stored = store.channel_by_server_id(channel_id).unwrap().unwrap();
    assert_eq!(stored.unread_count, 1);
    assert_eq!(stored.message_count, 1);
}

#[tokio::test]
async fn own_messages_do_not_count_as_unread() {
    let engine = test_engine(true).await;
    let channel = engine
        .reconciler
        .create_channel("general", None)
        .await
        .unwrap();
    let channel_id = channel.server_id.unwrap();

    // sender_id 3 is the local user in the test session.
    let wire = message_wire(ClientId::generate(), Some(5), channel_id, 3, "mine");
    engine.reconciler.apply_remote_message(wire).await.unwrap();

    let store = engine.reconciler.store().lock().await;
    let stored = store.channel_by_server_id(channel_id).unwrap().unwrap();
    assert_eq!(stored.unread_count, 0);
}

#[tokio::test]
async fn history_backfill_does_not_touch_unread() {
    let engine = test_engine(true).await;
    let channel = engine
        .reconciler
        .create_channel("general", None)
        .await
        .unwrap();
    let channel_id = channel.server_id.unwrap();

    let history = vec![
        message_wire(ClientId::generate(), Some(10), channel_id, 99, "old one"),
        message_wire(ClientId::generate(), Some(11), channel_id, 99, "old two"),
    ];
    engine
        .reconciler
        .apply_message_history(history)
        .await
        .unwrap();

    let store = engine.reconciler.store().lock().await;
    let stored = store.channel_by_server_id(channel_id).unwrap().unwrap();
    assert_eq!(stored.unread_count, 0);
    assert_eq!(store.channel_messages(channel_id).unwrap().len(), 2);
}

#[tokio::test]
async fn alert_dedup_across_bootstrap_and_push_sounds_once() {
    let engine = test_engine(true).await;
    let mut notices = engine.reconciler.subscribe();
    let client_id = ClientId::generate();

    engine.remote.seed_alert(alert_wire(client_id, Some(1), "Lockdown"));

    // Bootstrap load, then the realtime push of the same alert.
    engine.reconciler.bootstrap_alerts().await.unwrap();
    engine
        .reconciler
        .apply_remote_alert(alert_wire(client_id, Some(1), "Lockdown"))
        .await
        .unwrap();

    let audible = drain_notices(&mut notices)
        .into_iter()
        .filter(|n| matches!(n, Notice::AlertRaised { audible: true, .. }))
        .count();
    assert_eq!(audible, 1);

    let active = engine.reconciler.active_alerts().await.unwrap();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn local_acknowledgment_survives_server_echo() {
    let engine = test_engine(true).await;
    let client_id = ClientId::generate();

    engine
        .reconciler
        .apply_remote_alert(alert_wire(client_id, Some(1), "Lockdown"))
        .await
        .unwrap();
    engine.reconciler.acknowledge_alert(&client_id).await.unwrap();

    engine
        .reconciler
        .apply_remote_alert(alert_wire(client_id, Some(1), "Lockdown"))
        .await
        .unwrap();

    let store = engine.reconciler.store().lock().await;
    let alert = store.alert(&client_id).unwrap().unwrap();
    assert!(alert.acknowledged);
}

#[tokio::test]
async fn cancel_alert_reaches_the_server_when_online() {
    let engine = test_engine(true).await;
    let client_id = ClientId::generate();
    engine
        .reconciler
        .apply_remote_alert(alert_wire(client_id, Some(8), "Lockdown"))
        .await
        .unwrap();

    let cancelled = engine.reconciler.cancel_alert(&client_id).await.unwrap();
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(engine.remote.cancelled_alerts(), vec![8]);

    assert!(engine.reconciler.active_alerts().await.unwrap().is_empty());
}

#[tokio::test]
async fn all_clear_cancels_emergencies_and_raises_high_alert() {
    let engine = test_engine(true).await;
    let emergency = ClientId::generate();
    engine
        .reconciler
        .apply_remote_alert(alert_wire(emergency, Some(1), "Lockdown"))
        .await
        .unwrap();

    engine.reconciler.all_clear().await.unwrap();

    let active = engine.reconciler.active_alerts().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].kind, AlertKind::AllClear);
    assert_eq!(active[0].level, AlertLevel::High);
}

#[tokio::test]
async fn offline_channel_create_is_local_only() {
    let engine = test_engine(false).await;
    let channel = engine
        .reconciler
        .create_channel("offline-club", None)
        .await
        .unwrap();
    assert_eq!(channel.sync_state, SyncState::LocalOnly);
    assert!(channel.server_id.is_none());
}

#[tokio::test]
async fn refresh_channels_merges_server_list() {
    let engine = test_engine(true).await;
    engine.remote.seed_channel(channel_wire(7, "general"));
    engine.remote.seed_channel(channel_wire(8, "random"));

    let channels = engine.reconciler.refresh_channels().await.unwrap();
    assert_eq!(channels.len(), 2);

    // Refreshing again must not duplicate.
    let channels = engine.reconciler.refresh_channels().await.unwrap();
    assert_eq!(channels.len(), 2);
}

#[tokio::test]
async fn load_channel_messages_dedups_history_against_local() {
    let engine = test_engine(true).await;
    let message = engine.reconciler.send_message(7, "mine").await.unwrap();

    engine.remote.seed_history(
        7,
        vec![
            message_wire(message.client_id, Some(1), 7, 3, "mine"),
            message_wire(ClientId::generate(), Some(2), 7, 99, "theirs"),
        ],
    );

    let messages = engine.reconciler.load_channel_messages(7).await.unwrap();
    assert_eq!(messages.len(), 2);
}

#[tokio::test]
async fn edit_message_pushes_and_promotes() {
    let engine = test_engine(true).await;
    let message = engine.reconciler.send_message(7, "hello").await.unwrap();

    let edited = engine
        .reconciler
        .edit_message(&message.client_id, "hello, edited")
        .await
        .unwrap();
    assert!(edited.edited);
    assert_eq!(edited.content, "hello, edited");
    assert_eq!(edited.sync_state, SyncState::Synced);
}

#[tokio::test]
async fn delete_message_is_soft_and_pushed() {
    let engine = test_engine(true).await;
    let message = engine.reconciler.send_message(7, "regret").await.unwrap();

    engine
        .reconciler
        .delete_message(&message.client_id)
        .await
        .unwrap();

    let store = engine.reconciler.store().lock().await;
    let stored = store.message(&message.client_id).unwrap().unwrap();
    assert!(stored.deleted);
    assert_eq!(stored.content, carrier_core::message::DELETED_PLACEHOLDER);
    drop(store);
    assert_eq!(engine.remote.deleted_messages(), vec![1]);
}

#[tokio::test]
async fn news_dedup_by_client_id() {
    let engine = test_engine(true).await;
    let client_id = ClientId::generate();
    let item = NewsWire {
        id: Some(4),
        client_id: Some(client_id),
        headline: "Gym closed".into(),
        body: "Floor refinishing".into(),
        category: None,
        author: "J. Ames".into(),
        published_at: Utc::now(),
        expires_at: None,
        scheduled_for: None,
        pinned: false,
        active: true,
    };
    engine.reconciler.apply_remote_news(item.clone()).await.unwrap();
    engine.reconciler.apply_remote_news(item).await.unwrap();

    let news = engine.reconciler.visible_news().await.unwrap();
    assert_eq!(news.len(), 1);
}

#[tokio::test]
async fn connectivity_change_is_published_and_persisted() {
    let engine = test_engine(true).await;
    let mut notices = engine.reconciler.subscribe();

    engine
        .reconciler
        .set_connectivity(ConnectionMode::Disconnected)
        .await;

    assert!(drain_notices(&mut notices)
        .iter()
        .any(|n| matches!(n, Notice::Connectivity(ConnectionMode::Disconnected))));

    let store = engine.reconciler.store().lock().await;
    let session = store.load_session().unwrap().unwrap();
    assert_eq!(session.mode, ConnectionMode::Disconnected);
}
