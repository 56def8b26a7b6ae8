// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote API client.
//!
//! Request/response operations against the server's REST surface. The
//! [`Remote`] trait is the testing seam: production code uses
//! [`HttpRemote`], tests inject a mock. Every authenticated call carries
//! the session's bearer token; the health check is unauthenticated.

use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use carrier_core::{AlertWire, ChannelWire, ClientId, MessageWire, NewsWire, ServerId};

/// Error type for remote operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Transport-level HTTP failure (refused, timeout, TLS, ...).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("api error: {message} ({status})")]
    Api { status: u16, message: String },

    /// The server answered 2xx but the body was not what we expected.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The endpoint URL is not usable.
    #[error("invalid remote configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Body of a message create call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub channel_id: ServerId,
    pub content: String,
    pub client_id: ClientId,
}

/// Body of a channel create call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub client_id: ClientId,
}

/// The server's REST surface, as used by the engine.
///
/// Trait methods return boxed futures so tests can provide mock
/// implementations without real sockets.
pub trait Remote: Send + Sync {
    /// Unauthenticated liveness probe.
    fn health_check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;

    /// Creates a message; the client id is the idempotency key.
    fn create_message(
        &self,
        request: SendMessageRequest,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<MessageWire>> + Send + '_>>;

    /// Replaces a message's content.
    fn edit_message(
        &self,
        server_id: ServerId,
        content: String,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<MessageWire>> + Send + '_>>;

    /// Soft-deletes a message server-side.
    fn delete_message(
        &self,
        server_id: ServerId,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<()>> + Send + '_>>;

    /// Looks a message up by its durable client id; `None` when the
    /// server has never seen it. Used before retrying a create whose
    /// response was lost.
    fn find_message(
        &self,
        client_id: ClientId,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Option<MessageWire>>> + Send + '_>>;

    /// One page of a channel's messages, oldest first.
    fn channel_messages(
        &self,
        channel_id: ServerId,
        page: u32,
        size: u32,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<MessageWire>>> + Send + '_>>;

    /// Creates a channel.
    fn create_channel(
        &self,
        request: CreateChannelRequest,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<ChannelWire>> + Send + '_>>;

    /// The user's channel list.
    fn list_channels(
        &self,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<ChannelWire>>> + Send + '_>>;

    /// Raises an alert.
    fn create_alert(
        &self,
        alert: AlertWire,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<AlertWire>> + Send + '_>>;

    /// Cancels an alert.
    fn cancel_alert(
        &self,
        server_id: ServerId,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<()>> + Send + '_>>;

    /// Alerts currently active server-side (bootstrap).
    fn active_alerts(
        &self,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<AlertWire>>> + Send + '_>>;

    /// Publishes a news item.
    fn create_news(
        &self,
        item: NewsWire,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<NewsWire>> + Send + '_>>;

    /// Updates a news item.
    fn update_news(
        &self,
        server_id: ServerId,
        item: NewsWire,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<NewsWire>> + Send + '_>>;

    /// Current news feed (bootstrap).
    fn list_news(&self) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<NewsWire>>> + Send + '_>>;
}

/// reqwest-based [`Remote`] implementation.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpRemote {
    /// Creates a client for the given base URL (scheme required).
    pub fn new(base_url: impl Into<String>) -> RemoteResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(HttpRemote {
            client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()?,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Installs (or clears) the bearer token used for authenticated calls.
    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.read() {
            Ok(guard) => match guard.as_deref() {
                Some(token) => request.bearer_auth(token),
                None => request,
            },
            Err(_) => request,
        }
    }

    /// Sends a request and decodes a JSON body, mapping non-success
    /// statuses to [`RemoteError::Api`].
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> RemoteResult<T> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }
        Ok(response.json::<T>().await?)
    }

    /// Sends a request and discards the body.
    async fn execute_unit(&self, request: reqwest::RequestBuilder) -> RemoteResult<()> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn api_error(status: StatusCode, body: &str) -> RemoteError {
    let message = if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        payload.message.or(payload.error)
    } else {
        None
    };
    let message = message.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            trimmed.to_string()
        }
    });
    RemoteError::Api {
        status: status.as_u16(),
        message,
    }
}

fn normalize_base_url(raw: String) -> RemoteResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RemoteError::InvalidConfiguration(
            "base URL must not be empty".to_string(),
        ));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}

impl Remote for HttpRemote {
    fn health_check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let request = self
                .client
                .get(self.url("/api/system/health"))
                .timeout(std::time::Duration::from_secs(5));
            match request.send().await {
                Ok(response) => response.status().is_success(),
                Err(e) => {
                    tracing::debug!("server not reachable: {}", e);
                    false
                }
            }
        })
    }

    fn create_message(
        &self,
        request: SendMessageRequest,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<MessageWire>> + Send + '_>> {
        Box::pin(async move {
            self.execute_json(self.client.post(self.url("/api/messages")).json(&request))
                .await
        })
    }

    fn edit_message(
        &self,
        server_id: ServerId,
        content: String,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<MessageWire>> + Send + '_>> {
        Box::pin(async move {
            let body = serde_json::json!({ "content": content });
            self.execute_json(
                self.client
                    .put(self.url(&format!("/api/messages/{server_id}")))
                    .json(&body),
            )
            .await
        })
    }

    fn delete_message(
        &self,
        server_id: ServerId,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.execute_unit(
                self.client
                    .delete(self.url(&format!("/api/messages/{server_id}"))),
            )
            .await
        })
    }

    fn find_message(
        &self,
        client_id: ClientId,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Option<MessageWire>>> + Send + '_>> {
        Box::pin(async move {
            let request = self
                .client
                .get(self.url(&format!("/api/messages/by-client-id/{client_id}")));
            let response = self.authorize(request).send().await?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(api_error(status, &body));
            }
            Ok(Some(response.json::<MessageWire>().await?))
        })
    }

    fn channel_messages(
        &self,
        channel_id: ServerId,
        page: u32,
        size: u32,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<MessageWire>>> + Send + '_>> {
        Box::pin(async move {
            self.execute_json(self.client.get(self.url(&format!(
                "/api/channels/{channel_id}/messages?page={page}&size={size}"
            ))))
            .await
        })
    }

    fn create_channel(
        &self,
        request: CreateChannelRequest,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<ChannelWire>> + Send + '_>> {
        Box::pin(async move {
            self.execute_json(self.client.post(self.url("/api/channels")).json(&request))
                .await
        })
    }

    fn list_channels(
        &self,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<ChannelWire>>> + Send + '_>> {
        Box::pin(async move {
            self.execute_json(self.client.get(self.url("/api/channels/mine")))
                .await
        })
    }

    fn create_alert(
        &self,
        alert: AlertWire,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<AlertWire>> + Send + '_>> {
        Box::pin(async move {
            self.execute_json(self.client.post(self.url("/api/alerts")).json(&alert))
                .await
        })
    }

    fn cancel_alert(
        &self,
        server_id: ServerId,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.execute_unit(
                self.client
                    .post(self.url(&format!("/api/alerts/{server_id}/cancel"))),
            )
            .await
        })
    }

    fn active_alerts(
        &self,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<AlertWire>>> + Send + '_>> {
        Box::pin(async move {
            self.execute_json(self.client.get(self.url("/api/alerts/active")))
                .await
        })
    }

    fn create_news(
        &self,
        item: NewsWire,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<NewsWire>> + Send + '_>> {
        Box::pin(async move {
            self.execute_json(self.client.post(self.url("/api/news")).json(&item))
                .await
        })
    }

    fn update_news(
        &self,
        server_id: ServerId,
        item: NewsWire,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<NewsWire>> + Send + '_>> {
        Box::pin(async move {
            self.execute_json(
                self.client
                    .put(self.url(&format!("/api/news/{server_id}")))
                    .json(&item),
            )
            .await
        })
    }

    fn list_news(&self) -> Pin<Box<dyn Future<Output = RemoteResult<Vec<NewsWire>>> + Send + '_>> {
        Box::pin(async move {
            self.execute_json(self.client.get(self.url("/api/news")))
                .await
        })
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
