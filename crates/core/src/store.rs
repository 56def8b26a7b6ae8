// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed local store.
//!
//! The [`Store`] is the authoritative copy of everything the user sees.
//! All rows are keyed by the durable client id; server ids are attached
//! as they become known. Upserts are atomic per client id
//! (`INSERT ... ON CONFLICT DO UPDATE`), and promotion to `synced` is
//! guarded by a status re-check so a concurrent pass can never regress a
//! row.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::alert::Alert;
use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::identity::{ClientId, ServerId};
use crate::message::Message;
use crate::news::NewsItem;
use crate::session::{ConnectionMode, Session};
use crate::sync::SyncState;

/// SQL schema for the local store.
pub const SCHEMA: &str = r#"
-- Chat messages, keyed by durable client id
CREATE TABLE IF NOT EXISTS messages (
    client_id TEXT PRIMARY KEY,
    server_id INTEGER,
    channel_id INTEGER NOT NULL,
    sender_id INTEGER NOT NULL,
    sender_name TEXT NOT NULL,
    content TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'text',
    timestamp TEXT NOT NULL,
    edited INTEGER NOT NULL DEFAULT 0,
    edited_at TEXT,
    deleted INTEGER NOT NULL DEFAULT 0,
    sync_state TEXT NOT NULL DEFAULT 'local_only',
    last_synced_at TEXT
);

-- Channels; server-id-primary but still carrying a client id
CREATE TABLE IF NOT EXISTS channels (
    client_id TEXT PRIMARY KEY,
    server_id INTEGER,
    name TEXT NOT NULL,
    description TEXT,
    kind TEXT NOT NULL DEFAULT 'public',
    unread_count INTEGER NOT NULL DEFAULT 0,
    last_message_at TEXT,
    message_count INTEGER NOT NULL DEFAULT 0,
    archived INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    sync_state TEXT NOT NULL DEFAULT 'local_only',
    last_synced_at TEXT
);

-- Emergency alerts
CREATE TABLE IF NOT EXISTS alerts (
    client_id TEXT PRIMARY KEY,
    server_id INTEGER,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    instructions TEXT,
    level TEXT NOT NULL,
    kind TEXT NOT NULL,
    issued_by TEXT NOT NULL,
    issued_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    acknowledged INTEGER NOT NULL DEFAULT 0,
    acknowledged_at TEXT,
    cancelled_at TEXT,
    requires_ack INTEGER NOT NULL DEFAULT 0,
    audible INTEGER NOT NULL DEFAULT 0,
    sync_state TEXT NOT NULL DEFAULT 'local_only',
    last_synced_at TEXT
);

-- News items
CREATE TABLE IF NOT EXISTS news (
    client_id TEXT PRIMARY KEY,
    server_id INTEGER,
    headline TEXT NOT NULL,
    body TEXT NOT NULL,
    category TEXT,
    author TEXT NOT NULL,
    published_at TEXT NOT NULL,
    expires_at TEXT,
    scheduled_for TEXT,
    pinned INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1,
    sync_state TEXT NOT NULL DEFAULT 'local_only',
    last_synced_at TEXT
);

-- Current session (at most one row)
CREATE TABLE IF NOT EXISTS session (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    user_id INTEGER,
    username TEXT NOT NULL,
    display_name TEXT NOT NULL,
    token TEXT,
    server_url TEXT NOT NULL,
    mode TEXT NOT NULL,
    last_connected TEXT,
    expires_at TEXT,
    remember INTEGER NOT NULL DEFAULT 0
);

-- Indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_messages_server
    ON messages(server_id) WHERE server_id IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_messages_channel ON messages(channel_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_messages_sync ON messages(sync_state);
CREATE UNIQUE INDEX IF NOT EXISTS idx_channels_server
    ON channels(server_id) WHERE server_id IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_channels_sync ON channels(sync_state);
CREATE INDEX IF NOT EXISTS idx_alerts_expires ON alerts(expires_at);
CREATE INDEX IF NOT EXISTS idx_alerts_sync ON alerts(sync_state);
CREATE INDEX IF NOT EXISTS idx_news_published ON news(published_at DESC);
CREATE INDEX IF NOT EXISTS idx_news_sync ON news(sync_state);
"#;

/// Parse a string value from the database, returning a rusqlite error on
/// parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Parse an optional RFC3339 timestamp from the database.
fn parse_timestamp_opt(
    value: Option<String>,
    column: &str,
) -> std::result::Result<Option<DateTime<Utc>>, rusqlite::Error> {
    match value {
        None => Ok(None),
        Some(s) => parse_timestamp(&s, column).map(Some),
    }
}

fn rfc3339_opt(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339())
}

/// Run schema creation and all migrations on a database connection.
///
/// Idempotent: safe to run on every open, including databases created by
/// older builds that may be missing columns.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_message_edit_columns(conn)?;
    migrate_add_news_schedule_column(conn)?;
    Ok(())
}

/// Migration: add edited/edited_at to message tables created before edits
/// shipped.
fn migrate_add_message_edit_columns(conn: &Connection) -> Result<()> {
    let has_edited: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('messages') WHERE name = 'edited'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !has_edited {
        conn.execute(
            "ALTER TABLE messages ADD COLUMN edited INTEGER NOT NULL DEFAULT 0",
            [],
        )?;
        conn.execute("ALTER TABLE messages ADD COLUMN edited_at TEXT", [])?;
    }
    Ok(())
}

/// Migration: add scheduled_for to news tables created before scheduled
/// publication shipped.
fn migrate_add_news_schedule_column(conn: &Connection) -> Result<()> {
    let has_scheduled: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('news') WHERE name = 'scheduled_for'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !has_scheduled {
        conn.execute("ALTER TABLE news ADD COLUMN scheduled_for TEXT", [])?;
    }
    Ok(())
}

/// The local store.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (or creates) the store at the given path and runs migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn)?;
        Ok(Store { conn })
    }

    /// Opens an in-memory store (tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Store { conn })
    }

    // ── Messages ─────────────────────────────────────────────────────

    fn parse_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
        let client_id: String = row.get("client_id")?;
        let kind: String = row.get("kind")?;
        let timestamp: String = row.get("timestamp")?;
        let sync_state: String = row.get("sync_state")?;
        Ok(Message {
            client_id: parse_db(&client_id, "client_id")?,
            server_id: row.get("server_id")?,
            channel_id: row.get("channel_id")?,
            sender_id: row.get("sender_id")?,
            sender_name: row.get("sender_name")?,
            content: row.get("content")?,
            kind: parse_db(&kind, "kind")?,
            timestamp: parse_timestamp(&timestamp, "timestamp")?,
            edited: row.get("edited")?,
            edited_at: parse_timestamp_opt(row.get("edited_at")?, "edited_at")?,
            deleted: row.get("deleted")?,
            sync_state: parse_db(&sync_state, "sync_state")?,
            last_synced_at: parse_timestamp_opt(row.get("last_synced_at")?, "last_synced_at")?,
        })
    }

    /// Atomically creates or replaces the message row for its client id.
    pub fn upsert_message(&self, message: &Message) -> Result<()> {
        self.conn.execute(
            "INSERT INTO messages (client_id, server_id, channel_id, sender_id, sender_name,
                                   content, kind, timestamp, edited, edited_at, deleted,
                                   sync_state, last_synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(client_id) DO UPDATE SET
                 server_id = excluded.server_id,
                 channel_id = excluded.channel_id,
                 sender_id = excluded.sender_id,
                 sender_name = excluded.sender_name,
                 content = excluded.content,
                 kind = excluded.kind,
                 timestamp = excluded.timestamp,
                 edited = excluded.edited,
                 edited_at = excluded.edited_at,
                 deleted = excluded.deleted,
                 sync_state = excluded.sync_state,
                 last_synced_at = excluded.last_synced_at",
            params![
                message.client_id.as_string(),
                message.server_id,
                message.channel_id,
                message.sender_id,
                message.sender_name,
                message.content,
                message.kind.as_str(),
                message.timestamp.to_rfc3339(),
                message.edited,
                rfc3339_opt(message.edited_at),
                message.deleted,
                message.sync_state.as_str(),
                rfc3339_opt(message.last_synced_at),
            ],
        )?;
        Ok(())
    }

    /// Looks up a message by its durable client id.
    pub fn message(&self, id: &ClientId) -> Result<Option<Message>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM messages WHERE client_id = ?1",
                params![id.as_string()],
                Self::parse_message,
            )
            .optional()?)
    }

    /// Looks up a message by its server id.
    pub fn message_by_server_id(&self, server_id: ServerId) -> Result<Option<Message>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM messages WHERE server_id = ?1",
                params![server_id],
                Self::parse_message,
            )
            .optional()?)
    }

    /// Messages of one channel, oldest first.
    pub fn channel_messages(&self, channel_id: ServerId) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM messages WHERE channel_id = ?1 ORDER BY timestamp ASC, rowid ASC",
        )?;
        let messages = stmt
            .query_map(params![channel_id], Self::parse_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Messages awaiting a push to the server, in creation order.
    pub fn messages_needing_sync(&self) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM messages WHERE sync_state IN ('local_only', 'pending')
             ORDER BY rowid ASC",
        )?;
        let messages = stmt
            .query_map([], Self::parse_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Marks a pending attempt: `local_only` rows become `pending`.
    pub fn mark_message_pending(&self, id: &ClientId) -> Result<()> {
        self.conn.execute(
            "UPDATE messages SET sync_state = 'pending'
             WHERE client_id = ?1 AND sync_state = 'local_only'",
            params![id.as_string()],
        )?;
        Ok(())
    }

    /// Attaches a server id and promotes the row to `synced`.
    ///
    /// Guarded by a status check: a row that is already `synced` is left
    /// untouched and `false` is returned, making repeated promotion a
    /// no-op.
    pub fn promote_message(
        &self,
        id: &ClientId,
        server_id: ServerId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE messages
             SET server_id = ?2, sync_state = 'synced', last_synced_at = ?3
             WHERE client_id = ?1 AND sync_state != 'synced'",
            params![id.as_string(), server_id, now.to_rfc3339()],
        )?;
        Ok(rows > 0)
    }

    // ── Channels ─────────────────────────────────────────────────────

    fn parse_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<Channel> {
        let client_id: String = row.get("client_id")?;
        let kind: String = row.get("kind")?;
        let created_at: String = row.get("created_at")?;
        let sync_state: String = row.get("sync_state")?;
        Ok(Channel {
            client_id: parse_db(&client_id, "client_id")?,
            server_id: row.get("server_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            kind: parse_db(&kind, "kind")?,
            unread_count: row.get("unread_count")?,
            last_message_at: parse_timestamp_opt(row.get("last_message_at")?, "last_message_at")?,
            message_count: row.get("message_count")?,
            archived: row.get("archived")?,
            created_at: parse_timestamp(&created_at, "created_at")?,
            sync_state: parse_db(&sync_state, "sync_state")?,
            last_synced_at: parse_timestamp_opt(row.get("last_synced_at")?, "last_synced_at")?,
        })
    }

    /// Atomically creates or replaces the channel row for its client id.
    pub fn upsert_channel(&self, channel: &Channel) -> Result<()> {
        self.conn.execute(
            "INSERT INTO channels (client_id, server_id, name, description, kind, unread_count,
                                   last_message_at, message_count, archived, created_at,
                                   sync_state, last_synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(client_id) DO UPDATE SET
                 server_id = excluded.server_id,
                 name = excluded.name,
                 description = excluded.description,
                 kind = excluded.kind,
                 unread_count = excluded.unread_count,
                 last_message_at = excluded.last_message_at,
                 message_count = excluded.message_count,
                 archived = excluded.archived,
                 created_at = excluded.created_at,
                 sync_state = excluded.sync_state,
                 last_synced_at = excluded.last_synced_at",
            params![
                channel.client_id.as_string(),
                channel.server_id,
                channel.name,
                channel.description,
                channel.kind.as_str(),
                channel.unread_count,
                rfc3339_opt(channel.last_message_at),
                channel.message_count,
                channel.archived,
                channel.created_at.to_rfc3339(),
                channel.sync_state.as_str(),
                rfc3339_opt(channel.last_synced_at),
            ],
        )?;
        Ok(())
    }

    /// Looks up a channel by client id.
    pub fn channel(&self, id: &ClientId) -> Result<Option<Channel>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM channels WHERE client_id = ?1",
                params![id.as_string()],
                Self::parse_channel,
            )
            .optional()?)
    }

    /// Looks up a channel by server id.
    pub fn channel_by_server_id(&self, server_id: ServerId) -> Result<Option<Channel>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM channels WHERE server_id = ?1",
                params![server_id],
                Self::parse_channel,
            )
            .optional()?)
    }

    /// Merges a server-confirmed channel into the store.
    ///
    /// Keyed on server id: an existing row keeps its client id; a new row
    /// is inserted as-is. Returns the stored channel.
    pub fn merge_remote_channel(&self, incoming: &Channel) -> Result<Channel> {
        let server_id = incoming
            .server_id
            .ok_or_else(|| Error::InvalidInput("remote channel without server id".into()))?;

        let mut merged = incoming.clone();
        if let Some(existing) = self.channel_by_server_id(server_id)? {
            merged.client_id = existing.client_id;
        }
        self.upsert_channel(&merged)?;
        Ok(merged)
    }

    /// Non-archived channels, most recently active first.
    pub fn list_channels(&self) -> Result<Vec<Channel>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM channels WHERE archived = 0
             ORDER BY last_message_at IS NULL, last_message_at DESC, created_at DESC",
        )?;
        let channels = stmt
            .query_map([], Self::parse_channel)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(channels)
    }

    /// Channels awaiting a push to the server, in creation order.
    pub fn channels_needing_sync(&self) -> Result<Vec<Channel>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM channels WHERE sync_state IN ('local_only', 'pending')
             ORDER BY rowid ASC",
        )?;
        let channels = stmt
            .query_map([], Self::parse_channel)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(channels)
    }

    /// Attaches a server id and promotes the channel to `synced` (status
    /// guarded, idempotent).
    pub fn promote_channel(
        &self,
        id: &ClientId,
        server_id: ServerId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE channels
             SET server_id = ?2, sync_state = 'synced', last_synced_at = ?3
             WHERE client_id = ?1 AND sync_state != 'synced'",
            params![id.as_string(), server_id, now.to_rfc3339()],
        )?;
        Ok(rows > 0)
    }

    /// Bumps a channel's message counters after a message lands in it.
    pub fn note_channel_message(
        &self,
        channel_id: ServerId,
        at: DateTime<Utc>,
        from_local_user: bool,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE channels
             SET message_count = message_count + 1,
                 last_message_at = ?2,
                 unread_count = unread_count + ?3
             WHERE server_id = ?1",
            params![channel_id, at.to_rfc3339(), i64::from(!from_local_user)],
        )?;
        Ok(())
    }

    /// Clears a channel's unread counter.
    pub fn mark_channel_read(&self, channel_id: ServerId) -> Result<()> {
        self.conn.execute(
            "UPDATE channels SET unread_count = 0 WHERE server_id = ?1",
            params![channel_id],
        )?;
        Ok(())
    }

    // ── Alerts ───────────────────────────────────────────────────────

    fn parse_alert(row: &rusqlite::Row<'_>) -> rusqlite::Result<Alert> {
        let client_id: String = row.get("client_id")?;
        let level: String = row.get("level")?;
        let kind: String = row.get("kind")?;
        let issued_at: String = row.get("issued_at")?;
        let expires_at: String = row.get("expires_at")?;
        let sync_state: String = row.get("sync_state")?;
        Ok(Alert {
            client_id: parse_db(&client_id, "client_id")?,
            server_id: row.get("server_id")?,
            title: row.get("title")?,
            body: row.get("body")?,
            instructions: row.get("instructions")?,
            level: parse_db(&level, "level")?,
            kind: parse_db(&kind, "kind")?,
            issued_by: row.get("issued_by")?,
            issued_at: parse_timestamp(&issued_at, "issued_at")?,
            expires_at: parse_timestamp(&expires_at, "expires_at")?,
            acknowledged: row.get("acknowledged")?,
            acknowledged_at: parse_timestamp_opt(row.get("acknowledged_at")?, "acknowledged_at")?,
            cancelled_at: parse_timestamp_opt(row.get("cancelled_at")?, "cancelled_at")?,
            requires_ack: row.get("requires_ack")?,
            audible: row.get("audible")?,
            sync_state: parse_db(&sync_state, "sync_state")?,
            last_synced_at: parse_timestamp_opt(row.get("last_synced_at")?, "last_synced_at")?,
        })
    }

    /// Atomically creates or replaces the alert row for its client id.
    pub fn upsert_alert(&self, alert: &Alert) -> Result<()> {
        self.conn.execute(
            "INSERT INTO alerts (client_id, server_id, title, body, instructions, level, kind,
                                 issued_by, issued_at, expires_at, acknowledged, acknowledged_at,
                                 cancelled_at, requires_ack, audible, sync_state, last_synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT(client_id) DO UPDATE SET
                 server_id = excluded.server_id,
                 title = excluded.title,
                 body = excluded.body,
                 instructions = excluded.instructions,
                 level = excluded.level,
                 kind = excluded.kind,
                 issued_by = excluded.issued_by,
                 issued_at = excluded.issued_at,
                 expires_at = excluded.expires_at,
                 acknowledged = excluded.acknowledged,
                 acknowledged_at = excluded.acknowledged_at,
                 cancelled_at = excluded.cancelled_at,
                 requires_ack = excluded.requires_ack,
                 audible = excluded.audible,
                 sync_state = excluded.sync_state,
                 last_synced_at = excluded.last_synced_at",
            params![
                alert.client_id.as_string(),
                alert.server_id,
                alert.title,
                alert.body,
                alert.instructions,
                alert.level.as_str(),
                alert.kind.as_str(),
                alert.issued_by,
                alert.issued_at.to_rfc3339(),
                alert.expires_at.to_rfc3339(),
                alert.acknowledged,
                rfc3339_opt(alert.acknowledged_at),
                rfc3339_opt(alert.cancelled_at),
                alert.requires_ack,
                alert.audible,
                alert.sync_state.as_str(),
                rfc3339_opt(alert.last_synced_at),
            ],
        )?;
        Ok(())
    }

    /// Looks up an alert by client id.
    pub fn alert(&self, id: &ClientId) -> Result<Option<Alert>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM alerts WHERE client_id = ?1",
                params![id.as_string()],
                Self::parse_alert,
            )
            .optional()?)
    }

    /// Alerts that are neither cancelled nor expired, most severe first.
    pub fn active_alerts(&self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM alerts
             WHERE cancelled_at IS NULL AND expires_at > ?1
             ORDER BY issued_at DESC",
        )?;
        let alerts = stmt
            .query_map(params![now.to_rfc3339()], Self::parse_alert)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alerts)
    }

    /// Alerts awaiting a push to the server, in creation order.
    pub fn alerts_needing_sync(&self) -> Result<Vec<Alert>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM alerts WHERE sync_state IN ('local_only', 'pending')
             ORDER BY rowid ASC",
        )?;
        let alerts = stmt
            .query_map([], Self::parse_alert)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alerts)
    }

    /// Attaches a server id and promotes the alert to `synced` (status
    /// guarded, idempotent).
    pub fn promote_alert(
        &self,
        id: &ClientId,
        server_id: ServerId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE alerts
             SET server_id = ?2, sync_state = 'synced', last_synced_at = ?3
             WHERE client_id = ?1 AND sync_state != 'synced'",
            params![id.as_string(), server_id, now.to_rfc3339()],
        )?;
        Ok(rows > 0)
    }

    // ── News ─────────────────────────────────────────────────────────

    fn parse_news(row: &rusqlite::Row<'_>) -> rusqlite::Result<NewsItem> {
        let client_id: String = row.get("client_id")?;
        let published_at: String = row.get("published_at")?;
        let sync_state: String = row.get("sync_state")?;
        Ok(NewsItem {
            client_id: parse_db(&client_id, "client_id")?,
            server_id: row.get("server_id")?,
            headline: row.get("headline")?,
            body: row.get("body")?,
            category: row.get("category")?,
            author: row.get("author")?,
            published_at: parse_timestamp(&published_at, "published_at")?,
            expires_at: parse_timestamp_opt(row.get("expires_at")?, "expires_at")?,
            scheduled_for: parse_timestamp_opt(row.get("scheduled_for")?, "scheduled_for")?,
            pinned: row.get("pinned")?,
            active: row.get("active")?,
            sync_state: parse_db(&sync_state, "sync_state")?,
            last_synced_at: parse_timestamp_opt(row.get("last_synced_at")?, "last_synced_at")?,
        })
    }

    /// Atomically creates or replaces the news row for its client id.
    pub fn upsert_news(&self, item: &NewsItem) -> Result<()> {
        self.conn.execute(
            "INSERT INTO news (client_id, server_id, headline, body, category, author,
                               published_at, expires_at, scheduled_for, pinned, active,
                               sync_state, last_synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(client_id) DO UPDATE SET
                 server_id = excluded.server_id,
                 headline = excluded.headline,
                 body = excluded.body,
                 category = excluded.category,
                 author = excluded.author,
                 published_at = excluded.published_at,
                 expires_at = excluded.expires_at,
                 scheduled_for = excluded.scheduled_for,
                 pinned = excluded.pinned,
                 active = excluded.active,
                 sync_state = excluded.sync_state,
                 last_synced_at = excluded.last_synced_at",
            params![
                item.client_id.as_string(),
                item.server_id,
                item.headline,
                item.body,
                item.category,
                item.author,
                item.published_at.to_rfc3339(),
                rfc3339_opt(item.expires_at),
                rfc3339_opt(item.scheduled_for),
                item.pinned,
                item.active,
                item.sync_state.as_str(),
                rfc3339_opt(item.last_synced_at),
            ],
        )?;
        Ok(())
    }

    /// Looks up a news item by client id.
    pub fn news_item(&self, id: &ClientId) -> Result<Option<NewsItem>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM news WHERE client_id = ?1",
                params![id.as_string()],
                Self::parse_news,
            )
            .optional()?)
    }

    /// News currently inside their visibility window, pinned first,
    /// newest first.
    pub fn visible_news(&self, now: DateTime<Utc>) -> Result<Vec<NewsItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM news
             WHERE active = 1
               AND published_at <= ?1
               AND (scheduled_for IS NULL OR scheduled_for <= ?1)
               AND (expires_at IS NULL OR expires_at > ?1)
             ORDER BY pinned DESC, published_at DESC",
        )?;
        let items = stmt
            .query_map(params![now.to_rfc3339()], Self::parse_news)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// News awaiting a push to the server, in creation order. Scheduled
    /// items whose time has not come are excluded.
    pub fn news_needing_sync(&self, now: DateTime<Utc>) -> Result<Vec<NewsItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM news
             WHERE sync_state IN ('local_only', 'pending')
               AND (scheduled_for IS NULL OR scheduled_for <= ?1)
             ORDER BY rowid ASC",
        )?;
        let items = stmt
            .query_map(params![now.to_rfc3339()], Self::parse_news)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Attaches a server id and promotes the item to `synced` (status
    /// guarded, idempotent).
    pub fn promote_news(
        &self,
        id: &ClientId,
        server_id: ServerId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE news
             SET server_id = ?2, sync_state = 'synced', last_synced_at = ?3
             WHERE client_id = ?1 AND sync_state != 'synced'",
            params![id.as_string(), server_id, now.to_rfc3339()],
        )?;
        Ok(rows > 0)
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Replaces the current session (at most one row exists).
    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.conn.execute("DELETE FROM session", [])?;
        self.conn.execute(
            "INSERT INTO session (id, user_id, username, display_name, token, server_url,
                                  mode, last_connected, expires_at, remember)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session.user_id,
                session.username,
                session.display_name,
                session.token,
                session.server_url,
                session.mode.as_str(),
                rfc3339_opt(session.last_connected),
                rfc3339_opt(session.expires_at),
                session.remember,
            ],
        )?;
        Ok(())
    }

    /// Loads the current session, if any.
    pub fn load_session(&self) -> Result<Option<Session>> {
        Ok(self
            .conn
            .query_row("SELECT * FROM session WHERE id = 1", [], |row| {
                let mode: String = row.get("mode")?;
                Ok(Session {
                    user_id: row.get("user_id")?,
                    username: row.get("username")?,
                    display_name: row.get("display_name")?,
                    token: row.get("token")?,
                    server_url: row.get("server_url")?,
                    mode: parse_db(&mode, "mode")?,
                    last_connected: parse_timestamp_opt(
                        row.get("last_connected")?,
                        "last_connected",
                    )?,
                    expires_at: parse_timestamp_opt(row.get("expires_at")?, "expires_at")?,
                    remember: row.get("remember")?,
                })
            })
            .optional()?)
    }

    /// Persists a connection-mode change on the current session.
    pub fn update_session_mode(&self, mode: ConnectionMode, now: DateTime<Utc>) -> Result<()> {
        if mode == ConnectionMode::Connected {
            self.conn.execute(
                "UPDATE session SET mode = ?1, last_connected = ?2 WHERE id = 1",
                params![mode.as_str(), now.to_rfc3339()],
            )?;
        } else {
            self.conn.execute(
                "UPDATE session SET mode = ?1 WHERE id = 1",
                params![mode.as_str()],
            )?;
        }
        Ok(())
    }

    /// Removes the current session.
    pub fn clear_session(&self) -> Result<()> {
        self.conn.execute("DELETE FROM session", [])?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
