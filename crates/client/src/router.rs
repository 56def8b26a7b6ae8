// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound event router.
//!
//! Consumes the decoded event stream from the realtime link and dispatches
//! each event to the owning reconciliation handler. The match is
//! exhaustive over the closed [`Event`] type, so adding an event kind is a
//! compile-time-checked change; genuinely unknown wire types never get
//! here (the link drops them at decode).
//!
//! Ordering matters for the two user-urgent classes: alert and message
//! events are fully reconciled (persisted and deduplicated) before any
//! notice reaches the presentation layer, which is what keeps an alert
//! delivered over both REST and realtime from sounding twice.

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use carrier_core::Event;

use crate::reconcile::Reconciler;
use crate::remote::Remote;

/// Dispatches inbound realtime events to the reconciliation engine.
pub struct EventRouter<R: Remote> {
    reconciler: Reconciler<R>,
}

impl<R: Remote> EventRouter<R> {
    pub fn new(reconciler: Reconciler<R>) -> Self {
        EventRouter { reconciler }
    }

    /// Drains the event stream until the link shuts down.
    pub async fn run(self, mut events: mpsc::Receiver<Event>) {
        while let Some(event) = events.recv().await {
            self.route(event).await;
        }
        debug!("event stream ended");
    }

    /// Routes one event. Handler errors are logged, never fatal: a bad
    /// payload must not affect the connection or other events.
    pub async fn route(&self, event: Event) {
        match event {
            Event::Message { action, message } => {
                debug!("message event: {:?}", action);
                if let Err(e) = self.reconciler.apply_remote_message(message).await {
                    warn!("dropping message event: {}", e);
                }
            }
            Event::MessageHistory {
                channel_id,
                messages,
            } => {
                debug!("history for channel {}: {} messages", channel_id, messages.len());
                if let Err(e) = self.reconciler.apply_message_history(messages).await {
                    warn!("dropping history batch: {}", e);
                }
            }
            Event::ChannelChanged { channel_id } => {
                debug!("channel event: {:?}", channel_id);
                if let Err(e) = self.reconciler.refresh_channels().await {
                    warn!("channel refresh failed: {}", e);
                }
            }
            Event::ChannelRead {
                channel_id,
                user_id,
            } => {
                if let Err(e) = self.reconciler.apply_remote_read(channel_id, user_id).await {
                    warn!("dropping read receipt: {}", e);
                }
            }
            Event::Presence { user_id, online } => {
                debug!("presence: user {} online={}", user_id, online);
            }
            Event::Typing {
                channel_id,
                user_id,
                typing,
            } => {
                debug!(
                    "typing: user {} in channel {} typing={}",
                    user_id, channel_id, typing
                );
            }
            Event::News(wire) => {
                if let Err(e) = self.reconciler.apply_remote_news(wire).await {
                    warn!("dropping news event: {}", e);
                }
            }
            Event::Alert(wire) => {
                if let Err(e) = self.reconciler.apply_remote_alert(wire).await {
                    warn!("dropping alert event: {}", e);
                }
            }
            Event::AlertCancelled { client_id } => {
                if let Err(e) = self.reconciler.apply_alert_cancelled(&client_id).await {
                    warn!("dropping alert cancellation: {}", e);
                }
            }
            Event::Notification { text } => {
                info!("server notification: {}", text);
            }
            Event::ServerError { text } => {
                error!("server reported error: {}", text);
            }
            Event::Pong { id } => {
                // Heartbeat pongs are consumed inside the link; one that
                // leaks this far is harmless.
                debug!("stray pong {}", id);
            }
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
