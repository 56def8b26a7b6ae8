// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Process-scoped session context.
//!
//! One [`SessionContext`] is constructed at startup and injected into every
//! component that needs identity, token or connectivity; there is no
//! ambient global. Connection-mode changes are published on a watch
//! channel; consumers decide on their own thread how to react.

use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use carrier_core::{ConnectionMode, ServerId, Session};

struct SessionInner {
    session: RwLock<Option<Session>>,
    mode_tx: watch::Sender<ConnectionMode>,
}

/// Shared handle to the current session and connection mode.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl SessionContext {
    /// Creates a context, seeded from a persisted session if one exists.
    pub fn new(initial: Option<Session>) -> Self {
        let mode = initial
            .as_ref()
            .map_or(ConnectionMode::Offline, |s| s.mode);
        let (mode_tx, _) = watch::channel(mode);
        SessionContext {
            inner: Arc::new(SessionInner {
                session: RwLock::new(initial),
                mode_tx,
            }),
        }
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Option<Session> {
        self.inner.session.read().ok().and_then(|s| s.clone())
    }

    /// Replaces the current session and publishes its mode.
    pub fn set_session(&self, session: Session) {
        let mode = session.mode;
        if let Ok(mut guard) = self.inner.session.write() {
            *guard = Some(session);
        }
        self.inner.mode_tx.send_replace(mode);
    }

    /// Drops the current session (logout) and goes offline.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.session.write() {
            *guard = None;
        }
        self.inner.mode_tx.send_replace(ConnectionMode::Offline);
    }

    /// Current bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.session().and_then(|s| s.token)
    }

    /// Server user id of the local user; 0 for offline-only sessions.
    pub fn user_id(&self) -> ServerId {
        self.session().and_then(|s| s.user_id).unwrap_or(0)
    }

    /// Display name stamped onto locally authored entities.
    pub fn display_name(&self) -> String {
        self.session()
            .map_or_else(|| "unknown".to_string(), |s| s.display_name)
    }

    /// Current connection mode.
    pub fn mode(&self) -> ConnectionMode {
        *self.inner.mode_tx.borrow()
    }

    /// True while the Remote API may be called.
    pub fn is_online(&self) -> bool {
        self.mode().is_online()
    }

    /// Publishes a connection-mode change, also updating the embedded
    /// session snapshot.
    pub fn set_mode(&self, mode: ConnectionMode) {
        if let Ok(mut guard) = self.inner.session.write() {
            if let Some(session) = guard.as_mut() {
                session.mode = mode;
            }
        }
        self.inner.mode_tx.send_replace(mode);
    }

    /// A watch receiver for connection-mode changes.
    pub fn watch_mode(&self) -> watch::Receiver<ConnectionMode> {
        self.inner.mode_tx.subscribe()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
