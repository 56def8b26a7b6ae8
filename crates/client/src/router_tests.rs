// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the event router.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::test_helpers::{alert_wire, drain_notices, message_wire, test_engine};
use carrier_core::{ClientId, EntityAction};

use crate::reconcile::Notice;

#[tokio::test]
async fn message_events_reach_the_store() {
    let engine = test_engine(true).await;
    let router = EventRouter::new(engine.reconciler.clone());

    let wire = message_wire(ClientId::generate(), Some(5), 7, 99, "routed");
    router
        .route(Event::Message {
            action: EntityAction::Create,
            message: wire,
        })
        .await;

    let store = engine.reconciler.store().lock().await;
    let rows = store.channel_messages(7).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].content, "routed");
}

#[tokio::test]
async fn alert_events_persist_before_the_notice_fires() {
    let engine = test_engine(true).await;
    let router = EventRouter::new(engine.reconciler.clone());
    let mut notices = engine.reconciler.subscribe();
    let client_id = ClientId::generate();

    router
        .route(Event::Alert(alert_wire(client_id, Some(1), "Lockdown")))
        .await;

    // By the time the notice is observable, the row is already there.
    let raised = drain_notices(&mut notices)
        .into_iter()
        .find(|n| matches!(n, Notice::AlertRaised { .. }));
    assert!(raised.is_some());

    let store = engine.reconciler.store().lock().await;
    assert!(store.alert(&client_id).unwrap().is_some());
}

#[tokio::test]
async fn history_events_backfill_without_unread() {
    let engine = test_engine(true).await;
    let channel = engine
        .reconciler
        .create_channel("general", None)
        .await
        .unwrap();
    let channel_id = channel.server_id.unwrap();
    let router = EventRouter::new(engine.reconciler.clone());

    router
        .route(Event::MessageHistory {
            channel_id,
            messages: vec![
                message_wire(ClientId::generate(), Some(10), channel_id, 99, "a"),
                message_wire(ClientId::generate(), Some(11), channel_id, 99, "b"),
            ],
        })
        .await;

    let store = engine.reconciler.store().lock().await;
    assert_eq!(store.channel_messages(channel_id).unwrap().len(), 2);
    let stored = store.channel_by_server_id(channel_id).unwrap().unwrap();
    assert_eq!(stored.unread_count, 0);
}

#[tokio::test]
async fn own_read_receipt_clears_unread() {
    let engine = test_engine(true).await;
    let channel = engine
        .reconciler
        .create_channel("general", None)
        .await
        .unwrap();
    let channel_id = channel.server_id.unwrap();
    let router = EventRouter::new(engine.reconciler.clone());

    router
        .route(Event::Message {
            action: EntityAction::Create,
            message: message_wire(ClientId::generate(), Some(5), channel_id, 99, "unread"),
        })
        .await;

    // A receipt for some other user changes nothing.
    router
        .route(Event::ChannelRead {
            channel_id,
            user_id: Some(99),
        })
        .await;
    {
        let store = engine.reconciler.store().lock().await;
        let stored = store.channel_by_server_id(channel_id).unwrap().unwrap();
        assert_eq!(stored.unread_count, 1);
    }

    // Our own (user id 3 in the test session) clears the counter.
    router
        .route(Event::ChannelRead {
            channel_id,
            user_id: Some(3),
        })
        .await;
    let store = engine.reconciler.store().lock().await;
    let stored = store.channel_by_server_id(channel_id).unwrap().unwrap();
    assert_eq!(stored.unread_count, 0);
}

#[tokio::test]
async fn malformed_payloads_do_not_poison_the_router() {
    let engine = test_engine(true).await;
    let router = EventRouter::new(engine.reconciler.clone());

    let mut wire = message_wire(ClientId::generate(), Some(5), 7, 99, "anon");
    wire.client_id = None;
    router
        .route(Event::Message {
            action: EntityAction::Create,
            message: wire,
        })
        .await;

    // Dropped with a warning; the store is untouched and later events
    // still route.
    router
        .route(Event::Message {
            action: EntityAction::Create,
            message: message_wire(ClientId::generate(), Some(6), 7, 99, "fine"),
        })
        .await;

    let store = engine.reconciler.store().lock().await;
    let rows = store.channel_messages(7).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].content, "fine");
}

#[tokio::test]
async fn informational_events_are_inert() {
    let engine = test_engine(true).await;
    let router = EventRouter::new(engine.reconciler.clone());

    router
        .route(Event::Presence {
            user_id: 99,
            online: true,
        })
        .await;
    router
        .route(Event::Typing {
            channel_id: 7,
            user_id: 99,
            typing: true,
        })
        .await;
    router
        .route(Event::Notification {
            text: "maintenance tonight".into(),
        })
        .await;
    router
        .route(Event::ServerError {
            text: "rate limited".into(),
        })
        .await;
    router.route(Event::Pong { id: 9 }).await;
}
