// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The client facade.
//!
//! [`CarrierClient`] owns the whole engine: it spawns the realtime link,
//! the event router, the sync scheduler, and the link-state watcher that
//! translates transport state into connection modes (and kicks off the
//! REST bootstrap on every connect). The presentation layer holds one of
//! these, issues commands through it, and consumes [`Notice`]s from
//! [`CarrierClient::subscribe`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use carrier_core::{
    Alert, AlertKind, AlertLevel, Channel, ClientId, ConnectionMode, Message, NewsItem, ServerId,
    Session, Store,
};

use crate::config::CarrierConfig;
use crate::error::ClientResult;
use crate::reconcile::{Notice, Reconciler};
use crate::remote::{HttpRemote, Remote};
use crate::router::EventRouter;
use crate::scheduler::SyncScheduler;
use crate::session::SessionContext;
use crate::transport::{LinkHandle, LinkState, RealtimeLink, Transport, WsTransport};

/// The assembled engine.
pub struct CarrierClient<R: Remote = HttpRemote> {
    reconciler: Reconciler<R>,
    link: LinkHandle,
    link_join: JoinHandle<()>,
    router_join: JoinHandle<()>,
    scheduler_join: JoinHandle<()>,
    watcher_join: JoinHandle<()>,
}

impl CarrierClient<HttpRemote> {
    /// Opens the store, restores any persisted session, and starts the
    /// engine against the configured server.
    pub fn start(config: &CarrierConfig) -> ClientResult<Self> {
        let store_path = config.resolved_store_path();
        if let Some(parent) = store_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Store::open(store_path)?;
        let session = SessionContext::new(store.load_session()?);
        let remote = HttpRemote::new(&config.server_url)?;
        remote.set_token(session.token());
        Self::assemble(config, store, remote, WsTransport::new(), session)
    }
}

impl<R: Remote + 'static> CarrierClient<R> {
    /// Wires the engine from explicit parts. Tests inject mock transport
    /// and remote here.
    pub fn assemble<T: Transport + 'static>(
        config: &CarrierConfig,
        store: Store,
        remote: R,
        transport: T,
        session: SessionContext,
    ) -> ClientResult<Self> {
        let (link, events, link_join) = RealtimeLink::spawn(config.link_config(), transport);
        let reconciler = Reconciler::new(store, remote, session.clone(), link.clone());

        let router = EventRouter::new(reconciler.clone());
        let router_join = tokio::spawn(router.run(events));

        let scheduler = SyncScheduler::new(reconciler.clone(), config.sync_period());
        let scheduler_join = tokio::spawn(scheduler.run(session.watch_mode()));

        let watcher_join = tokio::spawn(Self::watch_link(
            reconciler.clone(),
            link.watch_state(),
        ));

        Ok(CarrierClient {
            reconciler,
            link,
            link_join,
            router_join,
            scheduler_join,
            watcher_join,
        })
    }

    /// Translates link state into connection modes and bootstraps from
    /// REST on every (re)connect.
    async fn watch_link(reconciler: Reconciler<R>, mut state_rx: watch::Receiver<LinkState>) {
        loop {
            if state_rx.changed().await.is_err() {
                break;
            }
            let state = *state_rx.borrow_and_update();
            let mode = match state {
                LinkState::Connected => ConnectionMode::Connected,
                LinkState::Connecting | LinkState::Closing | LinkState::Disconnected => {
                    ConnectionMode::Disconnected
                }
            };
            reconciler.set_connectivity(mode).await;

            if mode == ConnectionMode::Connected {
                // REST bootstrap: channels, active alerts, news. Realtime
                // echoes of anything in these lists dedup by client id.
                if let Err(e) = reconciler.refresh_channels().await {
                    warn!("channel bootstrap failed: {}", e);
                }
                if let Err(e) = reconciler.bootstrap_alerts().await {
                    warn!("alert bootstrap failed: {}", e);
                }
                if let Err(e) = reconciler.bootstrap_news().await {
                    warn!("news bootstrap failed: {}", e);
                }
            }
        }
    }

    /// Subscribes to the engine's change feed.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.reconciler.subscribe()
    }

    /// The session context.
    pub fn session(&self) -> &SessionContext {
        self.reconciler.session()
    }

    /// True while the realtime link is live.
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Persists and installs a session (login or offline sign-in).
    pub async fn install_session(&self, session: Session) -> ClientResult<()> {
        {
            let store = self.reconciler.store().lock().await;
            store.save_session(&session)?;
        }
        self.reconciler.session().set_session(session);
        Ok(())
    }

    // ── Command surface (delegates to the reconciliation engine) ─────

    pub async fn send_message(
        &self,
        channel_id: ServerId,
        content: impl Into<String>,
    ) -> ClientResult<Message> {
        self.reconciler.send_message(channel_id, content).await
    }

    pub async fn edit_message(
        &self,
        client_id: &ClientId,
        content: impl Into<String>,
    ) -> ClientResult<Message> {
        self.reconciler.edit_message(client_id, content).await
    }

    pub async fn delete_message(&self, client_id: &ClientId) -> ClientResult<()> {
        self.reconciler.delete_message(client_id).await
    }

    pub async fn load_channel_messages(&self, channel_id: ServerId) -> ClientResult<Vec<Message>> {
        self.reconciler.load_channel_messages(channel_id).await
    }

    pub async fn create_channel(
        &self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> ClientResult<Channel> {
        self.reconciler.create_channel(name, description).await
    }

    pub async fn channels(&self) -> ClientResult<Vec<Channel>> {
        self.reconciler.channels().await
    }

    pub async fn mark_channel_read(
        &self,
        channel_id: ServerId,
        last_message_id: ServerId,
    ) -> ClientResult<()> {
        self.reconciler
            .mark_channel_read(channel_id, last_message_id)
            .await
    }

    pub async fn raise_alert(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        instructions: Option<String>,
        level: AlertLevel,
        kind: AlertKind,
    ) -> ClientResult<Alert> {
        self.reconciler
            .raise_alert(title, body, instructions, level, kind)
            .await
    }

    pub async fn acknowledge_alert(&self, client_id: &ClientId) -> ClientResult<Alert> {
        self.reconciler.acknowledge_alert(client_id).await
    }

    pub async fn cancel_alert(&self, client_id: &ClientId) -> ClientResult<Alert> {
        self.reconciler.cancel_alert(client_id).await
    }

    pub async fn all_clear(&self) -> ClientResult<Alert> {
        self.reconciler.all_clear().await
    }

    pub async fn active_alerts(&self) -> ClientResult<Vec<Alert>> {
        self.reconciler.active_alerts().await
    }

    pub async fn publish_news(
        &self,
        headline: impl Into<String>,
        body: impl Into<String>,
        category: Option<String>,
    ) -> ClientResult<NewsItem> {
        self.reconciler.publish_news(headline, body, category).await
    }

    pub async fn schedule_news(
        &self,
        headline: impl Into<String>,
        body: impl Into<String>,
        category: Option<String>,
        publish_at: DateTime<Utc>,
    ) -> ClientResult<NewsItem> {
        self.reconciler
            .schedule_news(headline, body, category, publish_at)
            .await
    }

    pub async fn visible_news(&self) -> ClientResult<Vec<NewsItem>> {
        self.reconciler.visible_news().await
    }

    /// Shuts the engine down: the link stops reconnecting, drains and
    /// closes; the router ends with the event stream; the scheduler and
    /// watcher are stopped. Bounded by `timeout` per stage.
    pub async fn shutdown(self, timeout: Duration) {
        self.link.shutdown().await;
        if tokio::time::timeout(timeout, self.link_join).await.is_err() {
            warn!("link did not shut down in time");
        }
        if tokio::time::timeout(timeout, self.router_join)
            .await
            .is_err()
        {
            warn!("router did not shut down in time");
        }
        self.scheduler_join.abort();
        if tokio::time::timeout(timeout, self.watcher_join)
            .await
            .is_err()
        {
            warn!("link watcher did not shut down in time");
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
