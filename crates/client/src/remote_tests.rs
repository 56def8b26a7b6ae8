// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;

#[test]
fn base_url_requires_scheme() {
    assert!(HttpRemote::new("talk.example.org").is_err());
    assert!(HttpRemote::new("").is_err());
    assert!(HttpRemote::new("https://talk.example.org").is_ok());
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let remote = HttpRemote::new("https://talk.example.org/").unwrap();
    assert_eq!(remote.url("/api/news"), "https://talk.example.org/api/news");
}

#[test]
fn api_error_prefers_structured_message() {
    let err = api_error(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"message": "content must not be empty"}"#,
    );
    match err {
        RemoteError::Api { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "content must not be empty");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn api_error_falls_back_to_body_then_status() {
    match api_error(StatusCode::BAD_GATEWAY, "upstream down") {
        RemoteError::Api { message, .. } => assert_eq!(message, "upstream down"),
        other => panic!("unexpected error: {other}"),
    }
    match api_error(StatusCode::BAD_GATEWAY, "  ") {
        RemoteError::Api { message, .. } => assert_eq!(message, "HTTP 502"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn send_message_request_serializes_camel_case() {
    let request = SendMessageRequest {
        channel_id: 7,
        content: "hello".into(),
        client_id: ClientId::generate(),
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["channelId"], 7);
    assert!(json["clientId"].is_string());
}
