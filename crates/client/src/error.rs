// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the carrier engine.

use thiserror::Error;

use crate::remote::RemoteError;
use crate::transport::TransportError;

/// All possible errors that can surface from the engine.
///
/// Note that most sync failures do NOT surface here: a failed remote call
/// after a successful optimistic local write leaves the entity `pending`
/// for the scheduler and returns `Ok` to the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Core(#[from] carrier_core::Error),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for engine operations.
pub type ClientResult<T> = Result<T, ClientError>;
