// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The reconciliation engine.
//!
//! All entity mutation goes through the [`Reconciler`]; the presentation
//! layer never touches the store directly. The engine guarantees
//! at-most-once local materialization per client id regardless of arrival
//! path (REST response, realtime event, or local creation), and publishes
//! every user-visible change on a broadcast [`Notice`] stream.
//!
//! The two contracts, in short:
//!
//! - **Create locally, sync opportunistically**: persist first with
//!   `pending`/`local_only`, notify the presentation layer immediately,
//!   then try the Remote API. A failed remote call is not an error for
//!   the caller; the entity stays `pending` for the sync scheduler.
//! - **Receive a remote representation**: look up by client id; merge and
//!   promote when found, materialize as `synced` when not. Never a
//!   duplicate row.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use carrier_core::{
    Alert, AlertKind, AlertLevel, AlertWire, Channel, ClientId, Command, ConnectionMode, Message,
    MessageWire, NewsItem, NewsWire, ServerId, Store, SyncState,
};

use crate::error::ClientResult;
use crate::remote::{CreateChannelRequest, Remote, SendMessageRequest};
use crate::session::SessionContext;
use crate::transport::LinkHandle;

/// Engine-to-presentation change feed.
///
/// Delivered on a tokio broadcast channel; consumers receive on their own
/// task/thread, so the engine never mutates UI-observable state across
/// threads.
#[derive(Debug, Clone)]
pub enum Notice {
    /// A message appeared or changed; replace-by-client-id in the list.
    MessageUpserted(Message),
    /// The channel list (membership, counters, ordering) changed.
    ChannelsChanged,
    /// An alert was materialized for the first time. `audible` is true
    /// only on this first materialization, so a duplicate delivery of the
    /// same alert never sounds twice.
    AlertRaised { alert: Alert, audible: bool },
    /// An existing alert changed (acknowledged, cancelled, merged).
    AlertUpdated(Alert),
    /// The news feed changed.
    NewsChanged,
    /// Connection mode changed.
    Connectivity(ConnectionMode),
}

struct ReconcilerInner<R: Remote> {
    store: Mutex<Store>,
    remote: R,
    session: SessionContext,
    link: LinkHandle,
    notices: broadcast::Sender<Notice>,
}

/// The reconciliation engine. Cheap to clone; all clones share state.
pub struct Reconciler<R: Remote> {
    inner: Arc<ReconcilerInner<R>>,
}

impl<R: Remote> Clone for Reconciler<R> {
    fn clone(&self) -> Self {
        Reconciler {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Remote> Reconciler<R> {
    /// Wires the engine to its collaborators.
    pub fn new(store: Store, remote: R, session: SessionContext, link: LinkHandle) -> Self {
        let (notices, _) = broadcast::channel(1024);
        Reconciler {
            inner: Arc::new(ReconcilerInner {
                store: Mutex::new(store),
                remote,
                session,
                link,
                notices,
            }),
        }
    }

    /// Subscribes to the change feed.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// The session context this engine was built with.
    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    pub(crate) fn remote(&self) -> &R {
        &self.inner.remote
    }

    pub(crate) fn store(&self) -> &Mutex<Store> {
        &self.inner.store
    }

    fn notify(&self, notice: Notice) {
        // Nobody listening is fine (headless scheduler runs).
        let _ = self.inner.notices.send(notice);
    }

    // ── Connectivity ─────────────────────────────────────────────────

    /// Records a connection-mode change and tells the presentation layer.
    pub async fn set_connectivity(&self, mode: ConnectionMode) {
        self.inner.session.set_mode(mode);
        {
            let store = self.inner.store.lock().await;
            if let Err(e) = store.update_session_mode(mode, Utc::now()) {
                warn!("failed to persist connection mode: {}", e);
            }
        }
        self.notify(Notice::Connectivity(mode));
    }

    // ── Messages ─────────────────────────────────────────────────────

    /// Creates a message locally and syncs it opportunistically.
    ///
    /// The returned message is already visible to the presentation layer
    /// (a `MessageUpserted` notice fires before any network round trip).
    /// Remote failures leave the message `pending`; they never surface
    /// here.
    pub async fn send_message(
        &self,
        channel_id: ServerId,
        content: impl Into<String>,
    ) -> ClientResult<Message> {
        let connected = self.inner.session.is_online();
        let message = Message::compose(
            channel_id,
            self.inner.session.user_id(),
            self.inner.session.display_name(),
            content,
            connected,
            Utc::now(),
        );

        {
            let store = self.inner.store.lock().await;
            store.upsert_message(&message)?;
            store.note_channel_message(channel_id, message.timestamp, true)?;
        }
        self.notify(Notice::MessageUpserted(message.clone()));
        self.notify(Notice::ChannelsChanged);

        // Realtime copy rides the link's queueing policy independently of
        // the REST push; the server dedups by client id.
        self.inner.link.send(Command::SendMessage {
            channel_id,
            content: message.content.clone(),
            client_id: message.client_id,
        });

        if connected {
            let request = SendMessageRequest {
                channel_id,
                content: message.content.clone(),
                client_id: message.client_id,
            };
            match self.inner.remote.create_message(request).await {
                Ok(wire) => {
                    if let Some(server_id) = wire.id {
                        return self.promote_message(&message.client_id, server_id).await;
                    }
                    warn!("message create response carried no server id");
                }
                Err(e) => {
                    debug!("message create failed, left pending: {}", e);
                }
            }
        }

        Ok(message)
    }

    /// Attaches a server id, promotes to `synced`, and re-notifies.
    pub(crate) async fn promote_message(
        &self,
        client_id: &ClientId,
        server_id: ServerId,
    ) -> ClientResult<Message> {
        let store = self.inner.store.lock().await;
        store.promote_message(client_id, server_id, Utc::now())?;
        let message = store
            .message(client_id)?
            .ok_or_else(|| carrier_core::Error::MessageNotFound(client_id.to_string()))?;
        drop(store);
        self.notify(Notice::MessageUpserted(message.clone()));
        Ok(message)
    }

    /// Applies a message that arrived from the server (realtime event,
    /// REST bootstrap, or history backfill).
    ///
    /// Exactly one local row exists per client id afterwards, holding the
    /// most recently applied payload's fields.
    pub async fn apply_remote_message(&self, wire: MessageWire) -> ClientResult<()> {
        self.apply_message_wire(wire, true).await
    }

    async fn apply_message_wire(&self, wire: MessageWire, bump_unread: bool) -> ClientResult<()> {
        let incoming = wire.into_message(Utc::now())?;
        let from_local_user = incoming.sender_id == self.inner.session.user_id();

        let newly = {
            let store = self.inner.store.lock().await;
            let newly = store.message(&incoming.client_id)?.is_none();
            store.upsert_message(&incoming)?;
            if newly && bump_unread {
                store.note_channel_message(
                    incoming.channel_id,
                    incoming.timestamp,
                    from_local_user,
                )?;
            }
            newly
        };

        self.notify(Notice::MessageUpserted(incoming));
        if newly && bump_unread {
            self.notify(Notice::ChannelsChanged);
        }
        Ok(())
    }

    /// Applies a batch of history messages without touching unread
    /// counters (the channel list already carries server-side counts).
    pub async fn apply_message_history(&self, messages: Vec<MessageWire>) -> ClientResult<()> {
        for wire in messages {
            if let Err(e) = self.apply_message_wire(wire, false).await {
                warn!("skipping history message: {}", e);
            }
        }
        Ok(())
    }

    /// Edits a message locally and pushes the edit when possible.
    pub async fn edit_message(
        &self,
        client_id: &ClientId,
        content: impl Into<String>,
    ) -> ClientResult<Message> {
        let content = content.into();
        let message = {
            let store = self.inner.store.lock().await;
            let mut message = store
                .message(client_id)?
                .ok_or_else(|| carrier_core::Error::MessageNotFound(client_id.to_string()))?;
            message.edit(content.clone(), Utc::now());
            if message.sync_state == SyncState::Synced {
                message.sync_state = SyncState::Pending;
            }
            store.upsert_message(&message)?;
            message
        };
        self.notify(Notice::MessageUpserted(message.clone()));

        if self.inner.session.is_online() {
            if let Some(server_id) = message.server_id {
                match self.inner.remote.edit_message(server_id, content).await {
                    Ok(_) => return self.promote_message(client_id, server_id).await,
                    Err(e) => debug!("message edit failed, left pending: {}", e),
                }
            }
        }
        Ok(message)
    }

    /// Soft-deletes a message locally and pushes the delete when possible.
    pub async fn delete_message(&self, client_id: &ClientId) -> ClientResult<()> {
        let message = {
            let store = self.inner.store.lock().await;
            let mut message = store
                .message(client_id)?
                .ok_or_else(|| carrier_core::Error::MessageNotFound(client_id.to_string()))?;
            message.soft_delete();
            if message.sync_state == SyncState::Synced {
                message.sync_state = SyncState::Pending;
            }
            store.upsert_message(&message)?;
            message
        };
        self.notify(Notice::MessageUpserted(message.clone()));

        if self.inner.session.is_online() {
            if let Some(server_id) = message.server_id {
                match self.inner.remote.delete_message(server_id).await {
                    Ok(()) => {
                        self.promote_message(client_id, server_id).await?;
                    }
                    Err(e) => debug!("message delete failed, left pending: {}", e),
                }
            }
        }
        Ok(())
    }

    /// Loads one channel's messages: fetches a page from the server when
    /// online (deduplicated into the store), joins its realtime stream,
    /// and returns the local rows in timestamp order.
    pub async fn load_channel_messages(&self, channel_id: ServerId) -> ClientResult<Vec<Message>> {
        if self.inner.session.is_online() {
            match self.inner.remote.channel_messages(channel_id, 0, 50).await {
                Ok(wires) => self.apply_message_history(wires).await?,
                Err(e) => debug!("history fetch failed, serving local cache: {}", e),
            }
        }
        self.inner.link.send(Command::JoinChannel { channel_id });

        let store = self.inner.store.lock().await;
        Ok(store.channel_messages(channel_id)?)
    }

    // ── Channels ─────────────────────────────────────────────────────

    /// Creates a channel locally and syncs it opportunistically.
    pub async fn create_channel(
        &self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> ClientResult<Channel> {
        let connected = self.inner.session.is_online();
        let channel = Channel::create(name, description.clone(), connected, Utc::now());

        {
            let store = self.inner.store.lock().await;
            store.upsert_channel(&channel)?;
        }
        self.notify(Notice::ChannelsChanged);

        if connected {
            let request = CreateChannelRequest {
                name: channel.name.clone(),
                description,
                client_id: channel.client_id,
            };
            match self.inner.remote.create_channel(request).await {
                Ok(wire) => {
                    let store = self.inner.store.lock().await;
                    store.promote_channel(&channel.client_id, wire.id, Utc::now())?;
                    let promoted = store.channel(&channel.client_id)?.unwrap_or(channel);
                    drop(store);
                    self.notify(Notice::ChannelsChanged);
                    return Ok(promoted);
                }
                Err(e) => debug!("channel create failed, left pending: {}", e),
            }
        }
        Ok(channel)
    }

    /// Refreshes the channel list from the server and serves the merged
    /// local cache.
    pub async fn refresh_channels(&self) -> ClientResult<Vec<Channel>> {
        if self.inner.session.is_online() {
            match self.inner.remote.list_channels().await {
                Ok(wires) => {
                    let now = Utc::now();
                    let store = self.inner.store.lock().await;
                    for wire in wires {
                        let incoming = wire.into_channel(now);
                        if let Err(e) = store.merge_remote_channel(&incoming) {
                            warn!("skipping channel {}: {}", incoming.name, e);
                        }
                    }
                }
                Err(e) => debug!("channel list fetch failed, serving local cache: {}", e),
            }
            self.notify(Notice::ChannelsChanged);
        }

        let store = self.inner.store.lock().await;
        Ok(store.list_channels()?)
    }

    /// Channel list from the local store (no network).
    pub async fn channels(&self) -> ClientResult<Vec<Channel>> {
        let store = self.inner.store.lock().await;
        Ok(store.list_channels()?)
    }

    /// Clears a channel's unread counter and tells the server.
    pub async fn mark_channel_read(
        &self,
        channel_id: ServerId,
        last_message_id: ServerId,
    ) -> ClientResult<()> {
        {
            let store = self.inner.store.lock().await;
            store.mark_channel_read(channel_id)?;
        }
        self.inner.link.send(Command::MarkRead {
            channel_id,
            message_id: last_message_id,
        });
        self.notify(Notice::ChannelsChanged);
        Ok(())
    }

    /// Applies a read-receipt echo. Only receipts for the local user
    /// (another device of the same account) clear the counter.
    pub async fn apply_remote_read(
        &self,
        channel_id: ServerId,
        user_id: Option<ServerId>,
    ) -> ClientResult<()> {
        if user_id != Some(self.inner.session.user_id()) {
            return Ok(());
        }
        {
            let store = self.inner.store.lock().await;
            store.mark_channel_read(channel_id)?;
        }
        self.notify(Notice::ChannelsChanged);
        Ok(())
    }

    // ── Alerts ───────────────────────────────────────────────────────

    /// Raises an alert locally and syncs it opportunistically.
    pub async fn raise_alert(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        instructions: Option<String>,
        level: AlertLevel,
        kind: AlertKind,
    ) -> ClientResult<Alert> {
        let connected = self.inner.session.is_online();
        let alert = Alert::raise(
            title,
            body,
            instructions,
            level,
            kind,
            self.inner.session.display_name(),
            connected,
            Utc::now(),
        );

        {
            let store = self.inner.store.lock().await;
            store.upsert_alert(&alert)?;
        }
        info!("raised {} alert: {}", alert.level, alert.title);
        self.notify(Notice::AlertRaised {
            alert: alert.clone(),
            audible: alert.audible,
        });

        if connected {
            match self
                .inner
                .remote
                .create_alert(alert_to_wire(&alert))
                .await
            {
                Ok(wire) => {
                    if let Some(server_id) = wire.id {
                        let store = self.inner.store.lock().await;
                        store.promote_alert(&alert.client_id, server_id, Utc::now())?;
                        let promoted = store.alert(&alert.client_id)?.unwrap_or(alert);
                        return Ok(promoted);
                    }
                }
                Err(e) => debug!("alert create failed, left pending: {}", e),
            }
        }
        Ok(alert)
    }

    /// Applies an alert that arrived from the server (bootstrap list or
    /// realtime push).
    ///
    /// The `AlertRaised` notice (the only one that may trigger an
    /// audible side effect) fires only when the alert was newly
    /// materialized, after it has been persisted.
    pub async fn apply_remote_alert(&self, wire: AlertWire) -> ClientResult<()> {
        let now = Utc::now();
        let mut incoming = wire.into_alert(now)?;

        let newly = {
            let store = self.inner.store.lock().await;
            let existing = store.alert(&incoming.client_id)?;
            if let Some(previous) = &existing {
                // Local acknowledgment survives server echoes.
                incoming.acknowledged = previous.acknowledged;
                incoming.acknowledged_at = previous.acknowledged_at;
            }
            store.upsert_alert(&incoming)?;
            existing.is_none()
        };

        if newly {
            info!("alert received: [{}] {}", incoming.level, incoming.title);
            let audible = incoming.audible && incoming.is_active(now);
            self.notify(Notice::AlertRaised {
                alert: incoming,
                audible,
            });
        } else {
            self.notify(Notice::AlertUpdated(incoming));
        }
        Ok(())
    }

    /// Loads the server's active alerts into the store (bootstrap).
    pub async fn bootstrap_alerts(&self) -> ClientResult<()> {
        if !self.inner.session.is_online() {
            return Ok(());
        }
        match self.inner.remote.active_alerts().await {
            Ok(wires) => {
                for wire in wires {
                    if let Err(e) = self.apply_remote_alert(wire).await {
                        warn!("skipping bootstrap alert: {}", e);
                    }
                }
            }
            Err(e) => debug!("alert bootstrap failed: {}", e),
        }
        Ok(())
    }

    /// Records the local user's acknowledgment of an alert.
    pub async fn acknowledge_alert(&self, client_id: &ClientId) -> ClientResult<Alert> {
        let alert = {
            let store = self.inner.store.lock().await;
            let mut alert = store
                .alert(client_id)?
                .ok_or_else(|| carrier_core::Error::AlertNotFound(client_id.to_string()))?;
            alert.acknowledge(Utc::now());
            store.upsert_alert(&alert)?;
            alert
        };
        self.notify(Notice::AlertUpdated(alert.clone()));
        Ok(alert)
    }

    /// Cancels an alert locally and server-side when possible.
    pub async fn cancel_alert(&self, client_id: &ClientId) -> ClientResult<Alert> {
        let alert = {
            let store = self.inner.store.lock().await;
            let mut alert = store
                .alert(client_id)?
                .ok_or_else(|| carrier_core::Error::AlertNotFound(client_id.to_string()))?;
            alert.cancel(Utc::now());
            store.upsert_alert(&alert)?;
            alert
        };
        self.notify(Notice::AlertUpdated(alert.clone()));

        if self.inner.session.is_online() {
            if let Some(server_id) = alert.server_id {
                if let Err(e) = self.inner.remote.cancel_alert(server_id).await {
                    debug!("alert cancel failed, left local: {}", e);
                }
            }
        }
        Ok(alert)
    }

    /// Applies a server-side alert cancellation.
    pub async fn apply_alert_cancelled(&self, client_id: &ClientId) -> ClientResult<()> {
        let alert = {
            let store = self.inner.store.lock().await;
            let Some(mut alert) = store.alert(client_id)? else {
                debug!("cancellation for unknown alert {}", client_id);
                return Ok(());
            };
            if alert.cancelled_at.is_none() {
                alert.cancel(Utc::now());
                store.upsert_alert(&alert)?;
            }
            alert
        };
        self.notify(Notice::AlertUpdated(alert));
        Ok(())
    }

    /// Ends the emergency: cancels active emergency/urgent alerts and
    /// raises a high-priority all-clear.
    pub async fn all_clear(&self) -> ClientResult<Alert> {
        let now = Utc::now();
        let to_cancel: Vec<ClientId> = {
            let store = self.inner.store.lock().await;
            store
                .active_alerts(now)?
                .into_iter()
                .filter(|a| matches!(a.level, AlertLevel::Emergency | AlertLevel::Urgent))
                .map(|a| a.client_id)
                .collect()
        };
        for client_id in &to_cancel {
            self.cancel_alert(client_id).await?;
        }
        self.raise_alert(
            "ALL CLEAR",
            "The emergency has ended. Normal operations may resume.",
            Some("Please return to your normal activities.".to_string()),
            AlertLevel::High,
            AlertKind::AllClear,
        )
        .await
    }

    /// Active alerts from the local store.
    pub async fn active_alerts(&self) -> ClientResult<Vec<Alert>> {
        let store = self.inner.store.lock().await;
        Ok(store.active_alerts(Utc::now())?)
    }

    // ── News ─────────────────────────────────────────────────────────

    /// Publishes a news item locally and syncs it opportunistically.
    pub async fn publish_news(
        &self,
        headline: impl Into<String>,
        body: impl Into<String>,
        category: Option<String>,
    ) -> ClientResult<NewsItem> {
        let connected = self.inner.session.is_online();
        let item = NewsItem::publish(
            headline,
            body,
            category,
            self.inner.session.display_name(),
            connected,
            Utc::now(),
        );

        {
            let store = self.inner.store.lock().await;
            store.upsert_news(&item)?;
        }
        self.notify(Notice::NewsChanged);

        if connected {
            match self.inner.remote.create_news(news_to_wire(&item)).await {
                Ok(wire) => {
                    if let Some(server_id) = wire.id {
                        let store = self.inner.store.lock().await;
                        store.promote_news(&item.client_id, server_id, Utc::now())?;
                        let promoted = store.news_item(&item.client_id)?.unwrap_or(item);
                        return Ok(promoted);
                    }
                }
                Err(e) => debug!("news create failed, left pending: {}", e),
            }
        }
        Ok(item)
    }

    /// Schedules a news item for future publication. The scheduler pushes
    /// it once its time arrives.
    pub async fn schedule_news(
        &self,
        headline: impl Into<String>,
        body: impl Into<String>,
        category: Option<String>,
        publish_at: chrono::DateTime<Utc>,
    ) -> ClientResult<NewsItem> {
        let item = NewsItem::schedule(
            headline,
            body,
            category,
            self.inner.session.display_name(),
            publish_at,
            Utc::now(),
        );
        {
            let store = self.inner.store.lock().await;
            store.upsert_news(&item)?;
        }
        self.notify(Notice::NewsChanged);
        Ok(item)
    }

    /// Applies a news item that arrived from the server.
    pub async fn apply_remote_news(&self, wire: NewsWire) -> ClientResult<()> {
        let incoming = wire.into_news(Utc::now())?;
        {
            let store = self.inner.store.lock().await;
            store.upsert_news(&incoming)?;
        }
        self.notify(Notice::NewsChanged);
        Ok(())
    }

    /// Loads the server's news feed into the store (bootstrap).
    pub async fn bootstrap_news(&self) -> ClientResult<()> {
        if !self.inner.session.is_online() {
            return Ok(());
        }
        match self.inner.remote.list_news().await {
            Ok(wires) => {
                for wire in wires {
                    if let Err(e) = self.apply_remote_news(wire).await {
                        warn!("skipping bootstrap news item: {}", e);
                    }
                }
            }
            Err(e) => debug!("news bootstrap failed: {}", e),
        }
        Ok(())
    }

    /// Pins or unpins a news item.
    pub async fn pin_news(&self, client_id: &ClientId, pinned: bool) -> ClientResult<NewsItem> {
        self.mutate_news(client_id, |item| item.pinned = pinned).await
    }

    /// Activates or deactivates a news item.
    pub async fn set_news_active(
        &self,
        client_id: &ClientId,
        active: bool,
    ) -> ClientResult<NewsItem> {
        self.mutate_news(client_id, |item| item.active = active).await
    }

    async fn mutate_news(
        &self,
        client_id: &ClientId,
        mutate: impl FnOnce(&mut NewsItem),
    ) -> ClientResult<NewsItem> {
        let item = {
            let store = self.inner.store.lock().await;
            let mut item = store
                .news_item(client_id)?
                .ok_or_else(|| carrier_core::Error::NewsNotFound(client_id.to_string()))?;
            mutate(&mut item);
            if item.sync_state == SyncState::Synced {
                item.sync_state = SyncState::Pending;
            }
            store.upsert_news(&item)?;
            item
        };
        self.notify(Notice::NewsChanged);

        if self.inner.session.is_online() {
            if let Some(server_id) = item.server_id {
                match self
                    .inner
                    .remote
                    .update_news(server_id, news_to_wire(&item))
                    .await
                {
                    Ok(_) => {
                        let store = self.inner.store.lock().await;
                        store.promote_news(client_id, server_id, Utc::now())?;
                        if let Some(promoted) = store.news_item(client_id)? {
                            return Ok(promoted);
                        }
                    }
                    Err(e) => debug!("news update failed, left pending: {}", e),
                }
            }
        }
        Ok(item)
    }

    /// Visible news from the local store.
    pub async fn visible_news(&self) -> ClientResult<Vec<NewsItem>> {
        let store = self.inner.store.lock().await;
        Ok(store.visible_news(Utc::now())?)
    }
}

/// Wire form of a local alert for create calls.
pub(crate) fn alert_to_wire(alert: &Alert) -> AlertWire {
    AlertWire {
        id: alert.server_id,
        client_id: Some(alert.client_id),
        title: alert.title.clone(),
        body: alert.body.clone(),
        instructions: alert.instructions.clone(),
        level: alert.level,
        kind: alert.kind,
        issued_by: alert.issued_by.clone(),
        issued_at: alert.issued_at,
        expires_at: alert.expires_at,
        requires_ack: alert.requires_ack,
        audible: alert.audible,
    }
}

/// Wire form of a local news item for create/update calls.
pub(crate) fn news_to_wire(item: &NewsItem) -> NewsWire {
    NewsWire {
        id: item.server_id,
        client_id: Some(item.client_id),
        headline: item.headline.clone(),
        body: item.body.clone(),
        category: item.category.clone(),
        author: item.author.clone(),
        published_at: item.published_at,
        expires_at: item.expires_at,
        scheduled_for: item.scheduled_for,
        pinned: item.pinned,
        active: item.active,
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
