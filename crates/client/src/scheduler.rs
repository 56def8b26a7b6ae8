// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background sync scheduler.
//!
//! Periodically, and immediately on every reconnect, scans the store
//! for `pending`/`local_only` entities and pushes each to the Remote API,
//! promoting successes to `synced`. Failures are left unchanged for the
//! next pass, which bounds the retry rate to the scheduler period.
//!
//! The pass is idempotent: promotion is status-guarded in the store, and
//! a message create whose earlier attempt may have been accepted (state
//! `pending` rather than `local_only`) is preceded by a by-client-id
//! existence probe, so a response lost after a server-side commit never
//! produces a second server copy.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use carrier_core::{ConnectionMode, SyncState};

use crate::error::ClientResult;
use crate::reconcile::{alert_to_wire, news_to_wire, Reconciler};
use crate::remote::{CreateChannelRequest, Remote, SendMessageRequest};

/// Outcome of one scheduler pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Entities pushed to the server this pass.
    pub pushed: usize,
    /// Entities reconciled against an existing server copy without a
    /// new create (lost-response recovery).
    pub merged: usize,
    /// Entities whose push failed; left for the next pass.
    pub failed: usize,
}

impl SyncReport {
    fn is_empty(&self) -> bool {
        *self == SyncReport::default()
    }
}

/// The background sync pass driver.
pub struct SyncScheduler<R: Remote> {
    reconciler: Reconciler<R>,
    period: Duration,
}

impl<R: Remote> SyncScheduler<R> {
    pub fn new(reconciler: Reconciler<R>, period: Duration) -> Self {
        SyncScheduler { reconciler, period }
    }

    /// Runs until the connection-mode watch closes. A pass fires every
    /// period while online, plus once on each transition to online.
    pub async fn run(self, mut mode_rx: watch::Receiver<ConnectionMode>) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The immediate first tick; the on-connect trigger covers startup.
        ticker.tick().await;

        let mut was_online = mode_rx.borrow().is_online();
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if mode_rx.borrow().is_online() {
                        self.pass_logged().await;
                    }
                }
                changed = mode_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = mode_rx.borrow_and_update().is_online();
                    if online && !was_online {
                        debug!("connectivity restored, running sync pass");
                        self.pass_logged().await;
                    }
                    was_online = online;
                }
            }
        }
        debug!("sync scheduler stopped");
    }

    async fn pass_logged(&self) {
        match self.run_pass().await {
            Ok(report) if !report.is_empty() => {
                info!(
                    "sync pass: {} pushed, {} merged, {} failed",
                    report.pushed, report.merged, report.failed
                );
            }
            Ok(_) => {}
            Err(e) => warn!("sync pass aborted: {}", e),
        }
    }

    /// One full pass over every entity kind, in creation order within
    /// each kind. Channels go first so a locally created channel exists
    /// remotely before anything that depends on it.
    pub async fn run_pass(&self) -> ClientResult<SyncReport> {
        let mut report = SyncReport::default();
        if !self.reconciler.session().is_online() {
            return Ok(report);
        }
        if !self.reconciler.remote().health_check().await {
            debug!("server unreachable, skipping sync pass");
            return Ok(report);
        }

        self.pass_channels(&mut report).await?;
        self.pass_messages(&mut report).await?;
        self.pass_alerts(&mut report).await?;
        self.pass_news(&mut report).await?;
        Ok(report)
    }

    async fn pass_channels(&self, report: &mut SyncReport) -> ClientResult<()> {
        let candidates = {
            let store = self.reconciler.store().lock().await;
            store.channels_needing_sync()?
        };

        for channel in candidates {
            match channel.server_id {
                Some(server_id) => {
                    // Already known remotely; just settle the state.
                    let store = self.reconciler.store().lock().await;
                    store.promote_channel(&channel.client_id, server_id, Utc::now())?;
                    report.merged += 1;
                }
                None => {
                    let request = CreateChannelRequest {
                        name: channel.name.clone(),
                        description: channel.description.clone(),
                        client_id: channel.client_id,
                    };
                    match self.reconciler.remote().create_channel(request).await {
                        Ok(wire) => {
                            let store = self.reconciler.store().lock().await;
                            store.promote_channel(&channel.client_id, wire.id, Utc::now())?;
                            report.pushed += 1;
                        }
                        Err(e) => {
                            debug!("channel push failed: {}", e);
                            report.failed += 1;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn pass_messages(&self, report: &mut SyncReport) -> ClientResult<()> {
        let candidates = {
            let store = self.reconciler.store().lock().await;
            store.messages_needing_sync()?
        };

        for message in candidates {
            // Replays of edits and deletes for rows the server already has.
            if let Some(server_id) = message.server_id {
                let result = if message.deleted {
                    self.reconciler.remote().delete_message(server_id).await
                } else {
                    self.reconciler
                        .remote()
                        .edit_message(server_id, message.content.clone())
                        .await
                        .map(|_| ())
                };
                match result {
                    Ok(()) => {
                        self.reconciler
                            .promote_message(&message.client_id, server_id)
                            .await?;
                        report.pushed += 1;
                    }
                    Err(e) => {
                        debug!("message replay failed: {}", e);
                        report.failed += 1;
                    }
                }
                continue;
            }

            // A `pending` create may have been dispatched before; the
            // response could have been lost after the server committed.
            // Probe by client id before creating again.
            if message.sync_state == SyncState::Pending {
                match self
                    .reconciler
                    .remote()
                    .find_message(message.client_id)
                    .await
                {
                    Ok(Some(wire)) => {
                        if let Some(server_id) = wire.id {
                            self.reconciler
                                .promote_message(&message.client_id, server_id)
                                .await?;
                            report.merged += 1;
                            continue;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        debug!("existence probe failed: {}", e);
                        report.failed += 1;
                        continue;
                    }
                }
            } else {
                // First attempt: record it so a lost response is probed
                // next pass.
                let store = self.reconciler.store().lock().await;
                store.mark_message_pending(&message.client_id)?;
            }

            let request = SendMessageRequest {
                channel_id: message.channel_id,
                content: message.content.clone(),
                client_id: message.client_id,
            };
            match self.reconciler.remote().create_message(request).await {
                Ok(wire) => match wire.id {
                    Some(server_id) => {
                        self.reconciler
                            .promote_message(&message.client_id, server_id)
                            .await?;
                        report.pushed += 1;
                    }
                    None => {
                        warn!("create response without server id");
                        report.failed += 1;
                    }
                },
                Err(e) => {
                    debug!("message push failed: {}", e);
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }

    async fn pass_alerts(&self, report: &mut SyncReport) -> ClientResult<()> {
        let candidates = {
            let store = self.reconciler.store().lock().await;
            store.alerts_needing_sync()?
        };

        for alert in candidates {
            if let Some(server_id) = alert.server_id {
                let store = self.reconciler.store().lock().await;
                store.promote_alert(&alert.client_id, server_id, Utc::now())?;
                report.merged += 1;
                continue;
            }
            match self
                .reconciler
                .remote()
                .create_alert(alert_to_wire(&alert))
                .await
            {
                Ok(wire) => match wire.id {
                    Some(server_id) => {
                        let store = self.reconciler.store().lock().await;
                        store.promote_alert(&alert.client_id, server_id, Utc::now())?;
                        report.pushed += 1;
                    }
                    None => report.failed += 1,
                },
                Err(e) => {
                    debug!("alert push failed: {}", e);
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }

    async fn pass_news(&self, report: &mut SyncReport) -> ClientResult<()> {
        let candidates = {
            let store = self.reconciler.store().lock().await;
            store.news_needing_sync(Utc::now())?
        };

        for item in candidates {
            let result = match item.server_id {
                Some(server_id) => self
                    .reconciler
                    .remote()
                    .update_news(server_id, news_to_wire(&item))
                    .await,
                None => self.reconciler.remote().create_news(news_to_wire(&item)).await,
            };
            match result {
                Ok(wire) => {
                    let server_id = item.server_id.or(wire.id);
                    match server_id {
                        Some(server_id) => {
                            let store = self.reconciler.store().lock().await;
                            store.promote_news(&item.client_id, server_id, Utc::now())?;
                            report.pushed += 1;
                        }
                        None => report.failed += 1,
                    }
                }
                Err(e) => {
                    debug!("news push failed: {}", e);
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
