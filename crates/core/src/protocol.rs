// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime wire protocol.
//!
//! Every frame on the realtime channel is an [`Envelope`]: a coarse `type`,
//! a finer `action`, an opaque payload, and optional routing ids. Inbound
//! envelopes decode into the closed [`Event`] sum type; outbound traffic is
//! built from the closed [`Command`] sum type. Unknown envelope types
//! decode to `None` rather than an error so that newer servers can ship
//! event kinds this client does not know yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::{Alert, AlertKind, AlertLevel};
use crate::channel::{Channel, ChannelKind};
use crate::error::{Error, Result};
use crate::identity::{ClientId, ServerId};
use crate::message::{Message, MessageKind};
use crate::news::NewsItem;
use crate::sync::SyncState;

/// A raw frame on the realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Coarse event class; one of a fixed set, unknown values ignored.
    #[serde(rename = "type")]
    pub kind: String,
    /// Finer action within the class.
    pub action: String,
    /// Class-specific payload; shape depends on `type`/`action`.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
    /// Channel the frame concerns, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ServerId>,
    /// User the frame concerns, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ServerId>,
    /// Correlates a response frame with its request frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Server-side send time.
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Serializes the envelope to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes an envelope from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Mutation verb carried by message events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityAction {
    Create,
    Update,
    Delete,
}

/// Inbound events, decoded from envelopes.
///
/// This is a closed set: adding a new event kind is a compile-time-checked
/// change at every `match` site (the router in particular).
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A message was created, updated or deleted in a channel.
    Message {
        action: EntityAction,
        message: MessageWire,
    },
    /// Backfill of recent messages for one channel.
    MessageHistory {
        channel_id: ServerId,
        messages: Vec<MessageWire>,
    },
    /// A channel changed (created, updated, membership); the payload is
    /// advisory; clients refresh the channel list from the REST API.
    ChannelChanged { channel_id: Option<ServerId> },
    /// A user's unread position moved (read receipt echo).
    ChannelRead {
        channel_id: ServerId,
        user_id: Option<ServerId>,
    },
    /// A user went online or offline.
    Presence { user_id: ServerId, online: bool },
    /// Someone started or stopped typing in a channel.
    Typing {
        channel_id: ServerId,
        user_id: ServerId,
        typing: bool,
    },
    /// A news item was published or updated.
    News(NewsWire),
    /// An emergency alert was raised.
    Alert(AlertWire),
    /// An alert was cancelled server-side.
    AlertCancelled { client_id: ClientId },
    /// Informational notification text.
    Notification { text: String },
    /// The server reported an error for this connection.
    ServerError { text: String },
    /// Heartbeat response.
    Pong { id: u64 },
}

impl Event {
    /// Decodes an envelope into an event.
    ///
    /// Returns `Ok(None)` for unknown `type` values (forward
    /// compatibility) and `Err` for known types whose payload is
    /// malformed or missing its client id.
    pub fn decode(envelope: &Envelope) -> Result<Option<Event>> {
        match envelope.kind.as_str() {
            "message" => decode_message(envelope).map(Some),
            "channel" => decode_channel(envelope).map(Some),
            "presence" => decode_presence(envelope).map(Some),
            "typing" => decode_typing(envelope).map(Some),
            "news" => {
                let wire: NewsWire = serde_json::from_value(envelope.payload.clone())?;
                wire.require_client_id()?;
                Ok(Some(Event::News(wire)))
            }
            "alert" => decode_alert(envelope).map(Some),
            "notification" => Ok(Some(Event::Notification {
                text: payload_text(envelope),
            })),
            "error" => Ok(Some(Event::ServerError {
                text: payload_text(envelope),
            })),
            "pong" => {
                let pong: PongPayload = serde_json::from_value(envelope.payload.clone())?;
                Ok(Some(Event::Pong { id: pong.id }))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PongPayload {
    id: u64,
}

fn payload_text(envelope: &Envelope) -> String {
    match &envelope.payload {
        serde_json::Value::String(s) => s.clone(),
        other if other.is_null() => String::new(),
        other => other.to_string(),
    }
}

fn decode_message(envelope: &Envelope) -> Result<Event> {
    match envelope.action.as_str() {
        "history" => {
            let messages: Vec<MessageWire> = serde_json::from_value(envelope.payload.clone())?;
            let channel_id = envelope
                .channel_id
                .ok_or_else(|| Error::InvalidInput("message history without channel".into()))?;
            Ok(Event::MessageHistory {
                channel_id,
                messages,
            })
        }
        action => {
            let action = match action {
                "create" => EntityAction::Create,
                "update" => EntityAction::Update,
                "delete" => EntityAction::Delete,
                other => {
                    return Err(Error::InvalidInput(format!(
                        "unknown message action '{other}'"
                    )))
                }
            };
            let message: MessageWire = serde_json::from_value(envelope.payload.clone())?;
            message.require_client_id()?;
            Ok(Event::Message { action, message })
        }
    }
}

fn decode_channel(envelope: &Envelope) -> Result<Event> {
    match envelope.action.as_str() {
        "read" => {
            let channel_id = envelope
                .channel_id
                .ok_or_else(|| Error::InvalidInput("channel read without channel".into()))?;
            Ok(Event::ChannelRead {
                channel_id,
                user_id: envelope.user_id,
            })
        }
        _ => Ok(Event::ChannelChanged {
            channel_id: envelope.channel_id,
        }),
    }
}

fn decode_presence(envelope: &Envelope) -> Result<Event> {
    #[derive(Deserialize)]
    struct PresencePayload {
        online: bool,
    }
    let user_id = envelope
        .user_id
        .ok_or_else(|| Error::InvalidInput("presence without user".into()))?;
    let payload: PresencePayload = serde_json::from_value(envelope.payload.clone())?;
    Ok(Event::Presence {
        user_id,
        online: payload.online,
    })
}

fn decode_typing(envelope: &Envelope) -> Result<Event> {
    let channel_id = envelope
        .channel_id
        .ok_or_else(|| Error::InvalidInput("typing without channel".into()))?;
    let user_id = envelope
        .user_id
        .ok_or_else(|| Error::InvalidInput("typing without user".into()))?;
    Ok(Event::Typing {
        channel_id,
        user_id,
        typing: envelope.action == "start",
    })
}

fn decode_alert(envelope: &Envelope) -> Result<Event> {
    match envelope.action.as_str() {
        "cancel" => {
            #[derive(Deserialize)]
            #[serde(rename_all = "camelCase")]
            struct CancelPayload {
                client_id: ClientId,
            }
            let payload: CancelPayload = serde_json::from_value(envelope.payload.clone())?;
            Ok(Event::AlertCancelled {
                client_id: payload.client_id,
            })
        }
        _ => {
            let wire: AlertWire = serde_json::from_value(envelope.payload.clone())?;
            wire.require_client_id()?;
            Ok(Event::Alert(wire))
        }
    }
}

/// Outbound commands, encoded into envelopes.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Send a chat message. Queued while disconnected.
    SendMessage {
        channel_id: ServerId,
        content: String,
        client_id: ClientId,
    },
    /// Typing indicator. Dropped while disconnected.
    Typing { channel_id: ServerId, typing: bool },
    /// Join a channel's realtime stream.
    JoinChannel { channel_id: ServerId },
    /// Read receipt. Dropped while disconnected.
    MarkRead {
        channel_id: ServerId,
        message_id: ServerId,
    },
    /// Heartbeat probe.
    Ping { id: u64 },
}

impl Command {
    /// True for the chat-message class, the only class worth queueing
    /// while disconnected; everything else is stale after a delay.
    pub fn survives_disconnect(&self) -> bool {
        matches!(self, Command::SendMessage { .. })
    }

    /// Encodes the command as a wire envelope.
    pub fn encode(&self, now: DateTime<Utc>) -> Envelope {
        match self {
            Command::SendMessage {
                channel_id,
                content,
                client_id,
            } => Envelope {
                kind: "message".into(),
                action: "create".into(),
                payload: serde_json::json!({
                    "channelId": channel_id,
                    "content": content,
                    "clientId": client_id,
                }),
                channel_id: Some(*channel_id),
                user_id: None,
                correlation_id: Some(client_id.as_string()),
                timestamp: now,
            },
            Command::Typing {
                channel_id,
                typing,
            } => Envelope {
                kind: "typing".into(),
                action: if *typing { "start" } else { "stop" }.into(),
                payload: serde_json::Value::Null,
                channel_id: Some(*channel_id),
                user_id: None,
                correlation_id: None,
                timestamp: now,
            },
            Command::JoinChannel { channel_id } => Envelope {
                kind: "channel".into(),
                action: "join".into(),
                payload: serde_json::Value::Null,
                channel_id: Some(*channel_id),
                user_id: None,
                correlation_id: None,
                timestamp: now,
            },
            Command::MarkRead {
                channel_id,
                message_id,
            } => Envelope {
                kind: "channel".into(),
                action: "read".into(),
                payload: serde_json::json!({ "messageId": message_id }),
                channel_id: Some(*channel_id),
                user_id: None,
                correlation_id: None,
                timestamp: now,
            },
            Command::Ping { id } => Envelope {
                kind: "ping".into(),
                action: "heartbeat".into(),
                payload: serde_json::json!({ "id": id }),
                channel_id: None,
                user_id: None,
                correlation_id: None,
                timestamp: now,
            },
        }
    }
}

/// Message payload as it appears on the wire (realtime and REST).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageWire {
    /// Server id; present on everything the server sends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ServerId>,
    /// Durable client id; required on all synchronizable payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    pub channel_id: ServerId,
    pub sender_id: ServerId,
    pub sender_name: String,
    pub content: String,
    #[serde(default = "default_message_kind")]
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub edited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
}

fn default_message_kind() -> MessageKind {
    MessageKind::Text
}

impl MessageWire {
    /// Returns the client id or the structural error mandated for
    /// anonymous synchronizable content.
    pub fn require_client_id(&self) -> Result<ClientId> {
        self.client_id.ok_or(Error::MissingClientId)
    }

    /// Materializes a local entity from a server-confirmed payload.
    pub fn into_message(self, now: DateTime<Utc>) -> Result<Message> {
        let client_id = self.require_client_id()?;
        Ok(Message {
            client_id,
            server_id: self.id,
            channel_id: self.channel_id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            content: self.content,
            kind: self.kind,
            timestamp: self.timestamp,
            edited: self.edited,
            edited_at: self.edited_at,
            deleted: self.deleted,
            sync_state: SyncState::Synced,
            last_synced_at: Some(now),
        })
    }

    /// Builds the wire form of a local message (for tests and echoes).
    pub fn from_message(message: &Message) -> Self {
        MessageWire {
            id: message.server_id,
            client_id: Some(message.client_id),
            channel_id: message.channel_id,
            sender_id: message.sender_id,
            sender_name: message.sender_name.clone(),
            content: message.content.clone(),
            kind: message.kind,
            timestamp: message.timestamp,
            edited: message.edited,
            edited_at: message.edited_at,
            deleted: message.deleted,
        }
    }
}

/// Channel payload as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelWire {
    pub id: ServerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_channel_kind")]
    pub kind: ChannelKind,
    #[serde(default)]
    pub unread_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_count: i64,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

fn default_channel_kind() -> ChannelKind {
    ChannelKind::Public
}

impl ChannelWire {
    /// Materializes a local entity from a server-confirmed payload.
    ///
    /// Channels are server-id-primary; a payload without a client id gets
    /// a fresh one (the server id remains the lookup key).
    pub fn into_channel(self, now: DateTime<Utc>) -> Channel {
        Channel {
            client_id: self.client_id.unwrap_or_else(ClientId::generate),
            server_id: Some(self.id),
            name: self.name,
            description: self.description,
            kind: self.kind,
            unread_count: self.unread_count,
            last_message_at: self.last_message_at,
            message_count: self.message_count,
            archived: self.archived,
            created_at: self.created_at,
            sync_state: SyncState::Synced,
            last_synced_at: Some(now),
        }
    }
}

/// Alert payload as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ServerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub level: AlertLevel,
    pub kind: AlertKind,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub requires_ack: bool,
    #[serde(default)]
    pub audible: bool,
}

impl AlertWire {
    /// Returns the client id or the structural error mandated for
    /// anonymous synchronizable content.
    pub fn require_client_id(&self) -> Result<ClientId> {
        self.client_id.ok_or(Error::MissingClientId)
    }

    /// Materializes a local entity from a server-confirmed payload.
    pub fn into_alert(self, now: DateTime<Utc>) -> Result<Alert> {
        let client_id = self.require_client_id()?;
        Ok(Alert {
            client_id,
            server_id: self.id,
            title: self.title,
            body: self.body,
            instructions: self.instructions,
            level: self.level,
            kind: self.kind,
            issued_by: self.issued_by,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            acknowledged: false,
            acknowledged_at: None,
            cancelled_at: None,
            requires_ack: self.requires_ack,
            audible: self.audible,
            sync_state: SyncState::Synced,
            last_synced_at: Some(now),
        })
    }
}

/// News payload as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ServerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    pub headline: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub author: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl NewsWire {
    /// Returns the client id or the structural error mandated for
    /// anonymous synchronizable content.
    pub fn require_client_id(&self) -> Result<ClientId> {
        self.client_id.ok_or(Error::MissingClientId)
    }

    /// Materializes a local entity from a server-confirmed payload.
    pub fn into_news(self, now: DateTime<Utc>) -> Result<NewsItem> {
        let client_id = self.require_client_id()?;
        Ok(NewsItem {
            client_id,
            server_id: self.id,
            headline: self.headline,
            body: self.body,
            category: self.category,
            author: self.author,
            published_at: self.published_at,
            expires_at: self.expires_at,
            scheduled_for: self.scheduled_for,
            pinned: self.pinned,
            active: self.active,
            sync_state: SyncState::Synced,
            last_synced_at: Some(now),
        })
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
