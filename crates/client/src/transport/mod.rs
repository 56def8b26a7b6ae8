// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime transport: one logical duplex connection to the server.
//!
//! The rest of the system sees (a) an inbound stream of decoded
//! [`carrier_core::Event`]s and (b) a non-blocking `send(Command)`;
//! reconnect, backoff and heartbeat mechanics are hidden in here.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ RealtimeLink │────►│  Transport   │────►│    Server    │
//! │   (actor)    │◄────│   (trait)    │◄────│              │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │ PendingQueue │  (chat commands while disconnected)
//! └──────────────┘
//! ```
//!
//! # Delivery guarantees
//!
//! - Events come out in connection order; a reconnect may replay server
//!   state, so consumers must dedup by client id (the reconciler does).
//! - `send` never blocks: commands are handed to the actor over a
//!   channel. While disconnected, only chat messages are queued (bounded);
//!   typing indicators and read receipts are dropped, since they are not
//!   meaningful after a delay.
//! - One reconnect attempt is in flight at a time, by construction.

mod link;
mod queue;
mod socket;

pub use link::{backoff_delay, LinkConfig, LinkHandle, LinkState, RealtimeLink};
pub use queue::PendingQueue;
pub use socket::{Transport, TransportError, TransportResult, WsTransport};



#[cfg(test)]
mod link_tests;
