// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: a scriptable mock Remote API and a fully wired
//! test engine over mock transport + mock remote + in-memory store.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;

use carrier_core::{
    AlertWire, ChannelWire, ClientId, ConnectionMode, Event, MessageWire, NewsWire, ServerId,
    Session, Store,
};

use crate::reconcile::Reconciler;
use crate::remote::{
    CreateChannelRequest, Remote, RemoteError, RemoteResult, SendMessageRequest,
};
use crate::session::SessionContext;
use crate::transport::socket_tests::{MockController, MockTransport};
use crate::transport::{LinkConfig, LinkHandle, RealtimeLink};

#[derive(Default)]
struct MockRemoteShared {
    next_server_id: Mutex<ServerId>,
    fail_creates: Mutex<bool>,
    /// Server-side message table, keyed by client id (idempotency key).
    messages: Mutex<HashMap<String, MessageWire>>,
    create_message_calls: Mutex<u32>,
    find_message_calls: Mutex<u32>,
    channels: Mutex<Vec<ChannelWire>>,
    alerts: Mutex<Vec<AlertWire>>,
    news: Mutex<Vec<NewsWire>>,
    history: Mutex<HashMap<ServerId, Vec<MessageWire>>>,
    deleted_messages: Mutex<Vec<ServerId>>,
    cancelled_alerts: Mutex<Vec<ServerId>>,
}

/// Scriptable in-memory [`Remote`]. Clones share state, so tests keep one
/// handle for scripting/assertions while the engine owns another.
#[derive(Clone, Default)]
pub struct MockRemote {
    shared: Arc<MockRemoteShared>,
}

impl MockRemote {
    pub fn new() -> Self {
        MockRemote::default()
    }

    fn next_id(&self) -> ServerId {
        let mut guard = self.shared.next_server_id.lock().unwrap();
        *guard += 1;
        *guard
    }

    /// Fixes the server id the next create will hand out.
    pub fn set_next_server_id(&self, next: ServerId) {
        *self.shared.next_server_id.lock().unwrap() = next - 1;
    }

    /// Make every create call fail (server rejects / unreachable).
    pub fn fail_creates(&self, fail: bool) {
        *self.shared.fail_creates.lock().unwrap() = fail;
    }

    /// Pretend the server already holds this message (for probe tests).
    pub fn seed_message(&self, wire: MessageWire) {
        let key = wire.client_id.unwrap().as_string();
        self.shared.messages.lock().unwrap().insert(key, wire);
    }

    pub fn seed_channel(&self, wire: ChannelWire) {
        self.shared.channels.lock().unwrap().push(wire);
    }

    pub fn seed_alert(&self, wire: AlertWire) {
        self.shared.alerts.lock().unwrap().push(wire);
    }

    pub fn seed_news(&self, wire: NewsWire) {
        self.shared.news.lock().unwrap().push(wire);
    }

    pub fn seed_history(&self, channel_id: ServerId, messages: Vec<MessageWire>) {
        self.shared
            .history
            .lock()
            .unwrap()
            .insert(channel_id, messages);
    }

    pub fn create_message_calls(&self) -> u32 {
        *self.shared.create_message_calls.lock().unwrap()
    }

    pub fn find_message_calls(&self) -> u32 {
        *self.shared.find_message_calls.lock().unwrap()
    }

    pub fn deleted_messages(&self) -> Vec<ServerId> {
        self.shared.deleted_messages.lock().unwrap().clone()
    }

    pub fn cancelled_alerts(&self) -> Vec<ServerId> {
        self.shared.cancelled_alerts.lock().unwrap().clone()
    }

    fn rejection() -> RemoteError {
        RemoteError::Api {
            status: 503,
            message: "mock unavailable".into(),
        }
    }
}

impl Remote for MockRemote {
    fn health_check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move { true })
    }

    fn create_message(
        &self,
        request: SendMessageRequest,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<MessageWire>> + Send + '_>> {
        Box::pin(async move {
            *self.shared.create_message_calls.lock().unwrap() += 1;
            if *self.shared.fail_creates.lock().unwrap() {
                return Err(Self::rejection());
            }
            let key = request.client_id.as_string();
            // Idempotent create: a known client id returns the existing row.
            if let Some(existing) = self.shared.messages.lock().unwrap().get(&key) {
                return Ok(existing.clone());
            }
            let wire = MessageWire {
                id: Some(self.next_id()),
                client_id: Some(request.client_id),
                channel_id: request.channel_id,
                sender_id: 3,
                sender_name: "Dana Vole".into(),
                content: request.content,
                kind: carrier_core::MessageKind::Text,
                timestamp: Utc::now(),
                edited: false,
                edited_at: None,
                deleted: false,
            };
            self.shared
                .messages
                .lock()
                .unwrap()
                .insert(key, wire.clone());
            Ok(wire)
        })
    }

    fn edit_message(
        &self,
        server_id: ServerId,
        content: String,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<MessageWire>> + Send + '_>> {
        Box::pin(async move {
            if *self.shared.fail_creates.lock().unwrap() {
                return Err(Self::rejection());
            }
            let mut messages = self.shared.messages.lock().unwrap();
            let wire = messages
                .values_mut()
                .find(|w| w.id == Some(server_id))
                .ok_or(RemoteError::Api {
                    status: 404,
                    message: "no such message".into(),
                })?;
            wire.content = content;
            wire.edited = true;
            Ok(wire.clone())
        })
    }

    fn delete_message(
        &self,
        server_id: ServerId,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<()>> + Send + '_>> {
        Box::pin(async move {
            if *self.shared.fail_creates.lock().unwrap() {
                return Err(Self::rejection());
            }
            self.shared.deleted_messages.lock().unwrap().push(server_id);
            Ok(())
        })
    }

    fn find_message(
        &self,
        client_id: ClientId,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Option<MessageWire>>> + Send + '_>> {
        Box::pin(async move {
            *self.shared.find_message_calls.lock().unwrap() += 1;
            Ok(self
                .shared
                .messages
                .lock()
                .unwrap()
                .get(&client_id.as_string())
                .cloned())
        })
    }

    fn channel_messages(
        &self,
        channel_id: ServerId,
        _page: u32,
        _size: u32,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<MessageWire>>> + Send + '_>> {
        Box::pin(async move {
            Ok(self
                .shared
                .history
                .lock()
                .unwrap()
                .get(&channel_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn create_channel(
        &self,
        request: CreateChannelRequest,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<ChannelWire>> + Send + '_>> {
        Box::pin(async move {
            if *self.shared.fail_creates.lock().unwrap() {
                return Err(Self::rejection());
            }
            let wire = ChannelWire {
                id: self.next_id(),
                client_id: Some(request.client_id),
                name: request.name,
                description: request.description,
                kind: carrier_core::ChannelKind::Public,
                unread_count: 0,
                last_message_at: None,
                message_count: 0,
                archived: false,
                created_at: Utc::now(),
            };
            self.shared.channels.lock().unwrap().push(wire.clone());
            Ok(wire)
        })
    }

    fn list_channels(
        &self,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<ChannelWire>>> + Send + '_>> {
        Box::pin(async move { Ok(self.shared.channels.lock().unwrap().clone()) })
    }

    fn create_alert(
        &self,
        alert: AlertWire,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<AlertWire>> + Send + '_>> {
        Box::pin(async move {
            if *self.shared.fail_creates.lock().unwrap() {
                return Err(Self::rejection());
            }
            let mut wire = alert;
            wire.id = Some(self.next_id());
            self.shared.alerts.lock().unwrap().push(wire.clone());
            Ok(wire)
        })
    }

    fn cancel_alert(
        &self,
        server_id: ServerId,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.shared.cancelled_alerts.lock().unwrap().push(server_id);
            Ok(())
        })
    }

    fn active_alerts(
        &self,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<AlertWire>>> + Send + '_>> {
        Box::pin(async move { Ok(self.shared.alerts.lock().unwrap().clone()) })
    }

    fn create_news(
        &self,
        item: NewsWire,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<NewsWire>> + Send + '_>> {
        Box::pin(async move {
            if *self.shared.fail_creates.lock().unwrap() {
                return Err(Self::rejection());
            }
            let mut wire = item;
            wire.id = Some(self.next_id());
            self.shared.news.lock().unwrap().push(wire.clone());
            Ok(wire)
        })
    }

    fn update_news(
        &self,
        _server_id: ServerId,
        item: NewsWire,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<NewsWire>> + Send + '_>> {
        Box::pin(async move {
            if *self.shared.fail_creates.lock().unwrap() {
                return Err(Self::rejection());
            }
            Ok(item)
        })
    }

    fn list_news(&self) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<NewsWire>>> + Send + '_>> {
        Box::pin(async move { Ok(self.shared.news.lock().unwrap().clone()) })
    }
}

/// A fully wired engine over mocks.
pub struct TestEngine {
    pub reconciler: Reconciler<MockRemote>,
    pub remote: MockRemote,
    pub link: LinkHandle,
    pub link_ctl: MockController,
    pub events: mpsc::Receiver<Event>,
    pub link_join: tokio::task::JoinHandle<()>,
}

fn quick_link_config() -> LinkConfig {
    LinkConfig {
        base_delay: std::time::Duration::from_millis(10),
        jitter: std::time::Duration::ZERO,
        ..LinkConfig::default()
    }
}

/// Builds a reconciler over an in-memory store, mock remote and mock
/// transport. `online` controls the session's connection mode (the
/// engine's connectivity decisions key off the session, not the link).
pub async fn test_engine(online: bool) -> TestEngine {
    let store = Store::open_in_memory().unwrap();
    let session = if online {
        Session::authenticated(
            3,
            "dvole",
            "Dana Vole",
            "tok-123",
            "https://talk.example.org",
            None,
            Utc::now(),
        )
    } else {
        let mut session = Session::offline("dvole", "https://talk.example.org");
        session.user_id = Some(3);
        session
    };
    store.save_session(&session).unwrap();
    let context = SessionContext::new(Some(session));
    if !online {
        context.set_mode(ConnectionMode::Offline);
    }

    let (transport, link_ctl) = MockTransport::new();
    let (link, events, link_join) = RealtimeLink::spawn(quick_link_config(), transport);

    let remote = MockRemote::new();
    let reconciler = Reconciler::new(store, remote.clone(), context, link.clone());

    TestEngine {
        reconciler,
        remote,
        link,
        link_ctl,
        events,
        link_join,
    }
}

/// Wire-form message factory.
pub fn message_wire(
    client_id: ClientId,
    server_id: Option<ServerId>,
    channel_id: ServerId,
    sender_id: ServerId,
    content: &str,
) -> MessageWire {
    MessageWire {
        id: server_id,
        client_id: Some(client_id),
        channel_id,
        sender_id,
        sender_name: "Remote Sender".into(),
        content: content.into(),
        kind: carrier_core::MessageKind::Text,
        timestamp: Utc::now(),
        edited: false,
        edited_at: None,
        deleted: false,
    }
}

/// Wire-form alert factory.
pub fn alert_wire(client_id: ClientId, server_id: Option<ServerId>, title: &str) -> AlertWire {
    AlertWire {
        id: server_id,
        client_id: Some(client_id),
        title: title.into(),
        body: "Remain in place".into(),
        instructions: None,
        level: carrier_core::AlertLevel::Emergency,
        kind: carrier_core::AlertKind::Lockdown,
        issued_by: "Front Office".into(),
        issued_at: Utc::now(),
        expires_at: Utc::now() + chrono::Duration::hours(4),
        requires_ack: true,
        audible: true,
    }
}

/// Wire-form channel factory.
pub fn channel_wire(id: ServerId, name: &str) -> ChannelWire {
    ChannelWire {
        id,
        client_id: None,
        name: name.into(),
        description: None,
        kind: carrier_core::ChannelKind::Public,
        unread_count: 0,
        last_message_at: None,
        message_count: 0,
        archived: false,
        created_at: Utc::now(),
    }
}

/// Collects currently queued notices from a subscription without waiting.
pub fn drain_notices(
    rx: &mut tokio::sync::broadcast::Receiver<crate::reconcile::Notice>,
) -> Vec<crate::reconcile::Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}
