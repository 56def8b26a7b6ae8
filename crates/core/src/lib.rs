// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! carrier-core: Shared library for the carrier offline-first messaging client.
//!
//! This crate provides the entity model, durable-identity and sync-state
//! primitives, the SQLite local store, and the realtime wire protocol used
//! by the carrier engine crate.

pub mod alert;
pub mod channel;
pub mod error;
pub mod identity;
pub mod message;
pub mod news;
pub mod protocol;
pub mod session;
pub mod store;
pub mod sync;

pub use alert::{Alert, AlertKind, AlertLevel};
pub use channel::{Channel, ChannelKind};
pub use error::{Error, Result};
pub use identity::{ClientId, ServerId};
pub use message::{Message, MessageKind};
pub use news::NewsItem;
pub use protocol::{
    AlertWire, ChannelWire, Command, EntityAction, Envelope, Event, MessageWire, NewsWire,
};
pub use session::{ConnectionMode, Session};
pub use store::Store;
pub use sync::SyncState;
