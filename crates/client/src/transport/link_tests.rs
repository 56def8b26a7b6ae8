// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the realtime link actor.
//!
//! Timing-sensitive tests run under tokio's paused clock, so backoff and
//! heartbeat windows elapse instantly in real time.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(clippy::expect_used)]

use std::time::Duration;

use carrier_core::{ClientId, Command, Envelope, Event};
use chrono::Utc;

use super::link::{backoff_delay, LinkConfig, LinkHandle, LinkState, RealtimeLink};
use super::socket_tests::{MockController, MockTransport};

fn test_config() -> LinkConfig {
    LinkConfig {
        url: "ws://localhost:7420/ws".into(),
        max_reconnect_attempts: 10,
        base_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(5),
        jitter: Duration::ZERO,
        heartbeat_interval: Duration::from_secs(30),
        queue_capacity: 4,
    }
}

fn chat(channel_id: i64, content: &str) -> Command {
    Command::SendMessage {
        channel_id,
        content: content.into(),
        client_id: ClientId::generate(),
    }
}

fn pong_frame(id: u64) -> Envelope {
    Envelope {
        kind: "pong".into(),
        action: "heartbeat".into(),
        payload: serde_json::json!({ "id": id }),
        channel_id: None,
        user_id: None,
        correlation_id: None,
        timestamp: Utc::now(),
    }
}

fn message_frame(content: &str) -> Envelope {
    Envelope {
        kind: "message".into(),
        action: "create".into(),
        payload: serde_json::json!({
            "clientId": ClientId::generate(),
            "channelId": 7,
            "senderId": 3,
            "senderName": "Dana Vole",
            "content": content,
            "timestamp": "2026-03-14T09:26:53Z",
        }),
        channel_id: Some(7),
        user_id: None,
        correlation_id: None,
        timestamp: Utc::now(),
    }
}

async fn wait_for_state(handle: &LinkHandle, state: LinkState) {
    let mut rx = handle.watch_state();
    tokio::time::timeout(Duration::from_secs(600), rx.wait_for(|s| *s == state))
        .await
        .expect("state not reached in time")
        .unwrap();
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(600), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[test]
fn backoff_is_monotonic_until_cap() {
    let base = Duration::from_secs(1);
    let cap = Duration::from_secs(60);
    let mut previous = Duration::ZERO;
    for attempt in 0..20 {
        let delay = backoff_delay(base, cap, attempt);
        assert!(delay >= previous, "delay shrank at attempt {attempt}");
        assert!(delay <= cap, "delay exceeded cap at attempt {attempt}");
        previous = delay;
    }
    assert_eq!(backoff_delay(base, cap, 0), base);
    assert_eq!(backoff_delay(base, cap, 19), cap);
}

#[tokio::test(start_paused = true)]
async fn connects_and_shuts_down() {
    let (transport, ctl) = MockTransport::new();
    let (handle, _events, join) = RealtimeLink::spawn(test_config(), transport);

    wait_for_state(&handle, LinkState::Connected).await;
    assert!(handle.is_connected());
    assert_eq!(ctl.connect_count(), 1);

    handle.shutdown().await;
    tokio::time::timeout(Duration::from_secs(10), join)
        .await
        .expect("actor did not exit")
        .unwrap();
    assert_eq!(handle.state(), LinkState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn retries_with_backoff_and_resets_attempt_counter() {
    let (transport, ctl) = MockTransport::new();
    ctl.fail_next_connects(3);
    let (handle, _events, join) = RealtimeLink::spawn(test_config(), transport);

    wait_for_state(&handle, LinkState::Connected).await;
    assert_eq!(ctl.connect_count(), 1);

    // Drop the connection; the counter was reset on success, so the
    // link has a full budget again and reconnects.
    ctl.close_stream();
    wait_until(|| ctl.connect_count() == 2).await;

    handle.shutdown().await;
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn chat_commands_queue_while_disconnected_and_flush_fifo() {
    let (transport, ctl) = MockTransport::new();
    ctl.fail_next_connects(2);
    let (handle, _events, join) = RealtimeLink::spawn(test_config(), transport);

    // Sent while the link is still failing to connect.
    assert!(handle.send(chat(1, "first")));
    assert!(handle.send(chat(2, "second")));
    assert!(handle.send(Command::Typing {
        channel_id: 1,
        typing: true,
    }));

    wait_for_state(&handle, LinkState::Connected).await;
    wait_until(|| ctl.sent().len() >= 2).await;

    let sent = ctl.sent();
    let chats: Vec<&Envelope> = sent.iter().filter(|e| e.kind == "message").collect();
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0].payload["content"], "first");
    assert_eq!(chats[1].payload["content"], "second");

    // The typing indicator was dropped, not queued.
    assert!(!sent.iter().any(|e| e.kind == "typing"));

    handle.shutdown().await;
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn queue_overflow_drops_new_chat_commands() {
    let (transport, ctl) = MockTransport::new();
    ctl.fail_next_connects(2);
    let mut config = test_config();
    config.queue_capacity = 2;
    let (handle, _events, join) = RealtimeLink::spawn(config, transport);

    for i in 0..4 {
        handle.send(chat(i, &format!("message {i}")));
    }

    wait_for_state(&handle, LinkState::Connected).await;
    wait_until(|| ctl.sent().iter().filter(|e| e.kind == "message").count() >= 2).await;

    // Only the first two fit the queue.
    let chats = ctl
        .sent()
        .iter()
        .filter(|e| e.kind == "message")
        .count();
    assert_eq!(chats, 2);

    handle.shutdown().await;
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn forwards_decoded_events_and_swallows_pongs() {
    let (transport, ctl) = MockTransport::new();
    let (handle, mut events, join) = RealtimeLink::spawn(test_config(), transport);

    wait_for_state(&handle, LinkState::Connected).await;
    ctl.push_frame(pong_frame(1));
    ctl.push_frame(message_frame("hello"));

    let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .unwrap()
        .unwrap();
    // The pong is consumed by the heartbeat tracker; the first event the
    // consumer sees is the message.
    match event {
        Event::Message { message, .. } => assert_eq!(message.content, "hello"),
        other => panic!("unexpected event: {other:?}"),
    }

    handle.shutdown().await;
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stale_connection_forces_reconnect() {
    let (transport, ctl) = MockTransport::new();
    let (handle, _events, join) = RealtimeLink::spawn(test_config(), transport);

    wait_for_state(&handle, LinkState::Connected).await;
    assert_eq!(ctl.connect_count(), 1);

    // Never answer the pings: after two heartbeat intervals without a
    // pong the link must declare the connection stale and reconnect.
    wait_until(|| ctl.connect_count() >= 2).await;
    assert!(ctl.sent().iter().any(|e| e.kind == "ping"));

    handle.shutdown().await;
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pongs_keep_the_connection_alive() {
    let (transport, ctl) = MockTransport::new();
    let (handle, _events, join) = RealtimeLink::spawn(test_config(), transport);

    wait_for_state(&handle, LinkState::Connected).await;

    // Answer every ping for a while; the link must not reconnect.
    for i in 0..5u64 {
        tokio::time::sleep(Duration::from_secs(25)).await;
        ctl.push_frame(pong_frame(i));
    }
    assert_eq!(ctl.connect_count(), 1);

    handle.shutdown().await;
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn send_failure_requeues_chat_and_recovers() {
    let (transport, ctl) = MockTransport::new();
    let (handle, _events, join) = RealtimeLink::spawn(test_config(), transport);

    wait_for_state(&handle, LinkState::Connected).await;
    ctl.fail_sends(true);
    handle.send(chat(1, "survives"));

    // The failed send drops the connection; let the next cycle succeed.
    wait_until(|| ctl.connect_count() >= 2).await;
    ctl.fail_sends(false);

    wait_until(|| {
        ctl.sent()
            .iter()
            .any(|e| e.kind == "message" && e.payload["content"] == "survives")
    })
    .await;

    handle.shutdown().await;
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_attempts_and_degrades_to_offline() {
    let (transport, ctl) = MockTransport::new();
    ctl.fail_next_connects(u32::MAX);
    let mut config = test_config();
    config.max_reconnect_attempts = 3;
    let (handle, _events, join) = RealtimeLink::spawn(config, transport);

    wait_until(|| ctl.connect_attempts() == 3).await;
    // Give the clock room: the budget is spent, no further attempts may
    // happen.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(ctl.connect_attempts(), 3);
    assert_eq!(ctl.connect_count(), 0);
    assert_eq!(handle.state(), LinkState::Disconnected);

    // Still accepts (and queues) chat while degraded.
    assert!(handle.send(chat(1, "for later")));

    handle.shutdown().await;
    join.await.unwrap();
}
