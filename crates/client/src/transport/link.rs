// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The realtime link actor.
//!
//! [`RealtimeLink`] owns the [`Transport`] and runs as a single tokio task,
//! which serializes reconnect attempts by construction. Callers interact
//! through a [`LinkHandle`]: `send` is a channel try-send and never blocks,
//! connection state is published on a watch channel, and decoded inbound
//! events come out of an mpsc receiver.
//!
//! State machine: `Disconnected → Connecting → Connected → (Closing |
//! Connecting)`. A close that was not locally initiated re-enters
//! `Connecting` while reconnection is enabled and the bounded attempt
//! budget lasts; after that the link degrades to offline idle, still
//! queueing chat commands for a later process restart.

use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use carrier_core::{Command, Envelope, Event};

use super::queue::PendingQueue;
use super::socket::{Transport, TransportResult};

/// Tuning knobs for the realtime link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// WebSocket URL of the server.
    pub url: String,
    /// Maximum reconnection attempts before degrading to offline idle.
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Upper bound on the backoff delay.
    pub max_delay: Duration,
    /// Upper bound on the random jitter added to each backoff delay.
    pub jitter: Duration,
    /// Heartbeat ping interval. No pong for twice this long marks the
    /// connection stale.
    pub heartbeat_interval: Duration,
    /// Capacity of the disconnected chat-command queue.
    pub queue_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            url: "ws://localhost:7420/ws".to_string(),
            max_reconnect_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(30),
            queue_capacity: 100,
        }
    }
}

/// Connection state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection and none being attempted.
    Disconnected,
    /// A connect or reconnect attempt is in flight.
    Connecting,
    /// Live connection; heartbeat running.
    Connected,
    /// Local shutdown in progress.
    Closing,
}

/// Deterministic part of the reconnect delay: `min(base * 2^attempt, cap)`.
///
/// `attempt` is the number of failures so far, so the first retry waits
/// the base delay. The caller adds bounded random jitter on top.
pub fn backoff_delay(base: Duration, cap: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt)).min(cap)
}

enum LinkCommand {
    Send(Command),
    Shutdown,
}

/// Caller-side handle to a running link actor.
#[derive(Clone)]
pub struct LinkHandle {
    commands_tx: mpsc::Sender<LinkCommand>,
    state_rx: watch::Receiver<LinkState>,
}

impl LinkHandle {
    /// Hands a command to the link without blocking.
    ///
    /// Returns `false` if the link has shut down or its inbox is full;
    /// the command is dropped in that case, matching the transport's
    /// fire-and-forget contract.
    pub fn send(&self, command: Command) -> bool {
        match self.commands_tx.try_send(LinkCommand::Send(command)) {
            Ok(()) => true,
            Err(e) => {
                warn!("realtime command dropped: {}", e);
                false
            }
        }
    }

    /// Current connection state.
    pub fn state(&self) -> LinkState {
        *self.state_rx.borrow()
    }

    /// True while a live connection exists.
    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    /// A watch receiver for connection-state changes.
    pub fn watch_state(&self) -> watch::Receiver<LinkState> {
        self.state_rx.clone()
    }

    /// Asks the actor to shut down: reconnection is disabled, timers are
    /// cancelled, the queue is drained and the socket closed. Await the
    /// join handle returned by [`RealtimeLink::spawn`] to block until the
    /// actor has exited.
    pub async fn shutdown(&self) {
        let _ = self.commands_tx.send(LinkCommand::Shutdown).await;
    }
}

/// The link actor. Owns the transport; run via [`RealtimeLink::spawn`].
pub struct RealtimeLink<T: Transport> {
    config: LinkConfig,
    transport: T,
    queue: PendingQueue,
    attempts: u32,
    ping_seq: u64,
    last_pong: Instant,
    state_tx: watch::Sender<LinkState>,
    events_tx: mpsc::Sender<Event>,
    commands_rx: mpsc::Receiver<LinkCommand>,
}

enum Step {
    Inbound(TransportResult<Option<Envelope>>),
    Cmd(Option<LinkCommand>),
    HeartbeatTick,
}

/// Why the connected phase ended.
enum LinkDrop {
    Remote,
    Shutdown,
}

impl<T: Transport + 'static> RealtimeLink<T> {
    /// Spawns the link actor.
    ///
    /// Returns the caller handle, the inbound event stream, and the
    /// actor's join handle (await it after `shutdown` to bound teardown).
    pub fn spawn(
        config: LinkConfig,
        transport: T,
    ) -> (
        LinkHandle,
        mpsc::Receiver<Event>,
        tokio::task::JoinHandle<()>,
    ) {
        let (state_tx, state_rx) = watch::channel(LinkState::Disconnected);
        let (events_tx, events_rx) = mpsc::channel(256);
        let (commands_tx, commands_rx) = mpsc::channel(256);

        let link = RealtimeLink {
            queue: PendingQueue::new(config.queue_capacity),
            config,
            transport,
            attempts: 0,
            ping_seq: 0,
            last_pong: Instant::now(),
            state_tx,
            events_tx,
            commands_rx,
        };

        let handle = LinkHandle {
            commands_tx,
            state_rx,
        };
        let join = tokio::spawn(link.run());
        (handle, events_rx, join)
    }

    fn set_state(&self, state: LinkState) {
        self.state_tx.send_replace(state);
    }

    async fn run(mut self) {
        loop {
            // Connect phase, with backoff between attempts.
            self.set_state(LinkState::Connecting);
            match self.transport.connect(&self.config.url).await {
                Ok(()) => {
                    info!("realtime connection established");
                    self.attempts = 0;
                    self.last_pong = Instant::now();
                    self.set_state(LinkState::Connected);
                    self.flush_queue().await;
                }
                Err(e) => {
                    self.attempts += 1;
                    if self.attempts >= self.config.max_reconnect_attempts {
                        warn!(
                            "giving up after {} reconnect attempts: {}",
                            self.attempts, e
                        );
                        if self.offline_idle().await {
                            break;
                        }
                        continue;
                    }
                    let delay = backoff_delay(
                        self.config.base_delay,
                        self.config.max_delay,
                        self.attempts - 1,
                    ) + self.random_jitter();
                    debug!(
                        "reconnect attempt {} failed ({}), retrying in {:?}",
                        self.attempts, e, delay
                    );
                    self.set_state(LinkState::Disconnected);
                    if self.wait_before_retry(delay).await {
                        break;
                    }
                    continue;
                }
            }

            // Connected phase.
            match self.connected_phase().await {
                LinkDrop::Remote => {
                    self.attempts += 1;
                    if self.attempts >= self.config.max_reconnect_attempts {
                        warn!("connection lost and reconnect budget exhausted");
                        if self.offline_idle().await {
                            break;
                        }
                    }
                    // Loop back into the connect phase.
                }
                LinkDrop::Shutdown => break,
            }
        }

        self.set_state(LinkState::Closing);
        self.queue.clear();
        let _ = self.transport.disconnect().await;
        self.set_state(LinkState::Disconnected);
        info!("realtime link shut down");
    }

    fn random_jitter(&self) -> Duration {
        let bound = self.config.jitter.as_millis() as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=bound))
    }

    /// Sleeps out a backoff delay while still accepting commands.
    /// Returns true if a shutdown arrived.
    async fn wait_before_retry(&mut self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        loop {
            let step = tokio::select! {
                _ = tokio::time::sleep_until(deadline) => None,
                cmd = self.commands_rx.recv() => Some(cmd),
            };
            match step {
                None => return false,
                Some(cmd) => {
                    if self.handle_offline_command(cmd) {
                        return true;
                    }
                }
            }
        }
    }

    /// Terminal offline mode once the reconnect budget is exhausted.
    /// Chat commands keep queueing; everything else is dropped.
    /// Returns true if a shutdown arrived (always, eventually).
    async fn offline_idle(&mut self) -> bool {
        self.set_state(LinkState::Disconnected);
        loop {
            let cmd = self.commands_rx.recv().await;
            if self.handle_offline_command(cmd) {
                return true;
            }
        }
    }

    /// Applies the disconnected queueing policy to one command.
    /// Returns true on shutdown.
    fn handle_offline_command(&mut self, cmd: Option<LinkCommand>) -> bool {
        match cmd {
            Some(LinkCommand::Send(command)) => {
                if command.survives_disconnect() {
                    if !self.queue.push(command) {
                        warn!("pending queue full, chat message dropped");
                    }
                } else {
                    debug!("dropping non-chat command while disconnected");
                }
                false
            }
            Some(LinkCommand::Shutdown) | None => true,
        }
    }

    /// Sends everything queued while disconnected, in FIFO order.
    async fn flush_queue(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        info!("flushing {} queued commands", self.queue.len());
        while let Some(command) = self.queue.pop() {
            let envelope = command.encode(chrono::Utc::now());
            if let Err(e) = self.transport.send(envelope).await {
                warn!("flush interrupted, re-queueing: {}", e);
                self.queue.push_front(command);
                break;
            }
        }
    }

    /// Runs one live connection until it drops or shutdown is requested.
    async fn connected_phase(&mut self) -> LinkDrop {
        let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval);
        // The first tick of a tokio interval fires immediately; swallow
        // it so the first ping happens one full interval after connect.
        heartbeat.tick().await;

        loop {
            let step = {
                let recv = self.transport.recv();
                tokio::select! {
                    inbound = recv => Step::Inbound(inbound),
                    cmd = self.commands_rx.recv() => Step::Cmd(cmd),
                    _ = heartbeat.tick() => Step::HeartbeatTick,
                }
            };

            match step {
                Step::Inbound(Ok(Some(envelope))) => self.handle_inbound(envelope).await,
                Step::Inbound(Ok(None)) => {
                    info!("connection closed by server");
                    return LinkDrop::Remote;
                }
                Step::Inbound(Err(e)) => {
                    warn!("receive failed: {}", e);
                    return LinkDrop::Remote;
                }
                Step::Cmd(Some(LinkCommand::Send(command))) => {
                    let envelope = command.encode(chrono::Utc::now());
                    if let Err(e) = self.transport.send(envelope).await {
                        warn!("send failed: {}", e);
                        if command.survives_disconnect() && !self.queue.push(command) {
                            warn!("pending queue full, chat message dropped");
                        }
                        return LinkDrop::Remote;
                    }
                }
                Step::Cmd(Some(LinkCommand::Shutdown)) | Step::Cmd(None) => {
                    return LinkDrop::Shutdown;
                }
                Step::HeartbeatTick => {
                    if self.last_pong.elapsed() > self.config.heartbeat_interval * 2 {
                        warn!(
                            "no pong in {:?}, forcing reconnect of stale connection",
                            self.last_pong.elapsed()
                        );
                        let _ = self.transport.disconnect().await;
                        return LinkDrop::Remote;
                    }
                    self.ping_seq += 1;
                    let ping = Command::Ping { id: self.ping_seq }.encode(chrono::Utc::now());
                    if let Err(e) = self.transport.send(ping).await {
                        warn!("heartbeat send failed: {}", e);
                        return LinkDrop::Remote;
                    }
                }
            }
        }
    }

    /// Decodes one inbound envelope and forwards it to the event stream.
    async fn handle_inbound(&mut self, envelope: Envelope) {
        match Event::decode(&envelope) {
            Ok(Some(Event::Pong { id })) => {
                debug!("pong {}", id);
                self.last_pong = Instant::now();
            }
            Ok(Some(event)) => {
                if self.events_tx.send(event).await.is_err() {
                    debug!("event stream consumer gone");
                }
            }
            Ok(None) => {
                debug!("ignoring unknown event type '{}'", envelope.kind);
            }
            Err(e) => {
                warn!("dropping undecodable '{}' event: {}", envelope.kind, e);
            }
        }
    }
}
