// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::tempdir;

#[test]
fn minimal_file_gets_defaults() {
    let config: CarrierConfig =
        toml::from_str(r#"server_url = "https://talk.example.org""#).unwrap();
    assert_eq!(config.reconnect_max_attempts, 10);
    assert_eq!(config.reconnect_base_delay_ms, 1000);
    assert_eq!(config.reconnect_max_delay_ms, 60_000);
    assert_eq!(config.heartbeat_interval_ms, 30_000);
    assert_eq!(config.queue_capacity, 100);
    assert_eq!(config.sync_period_secs, 60);
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = CarrierConfig::for_server("https://talk.example.org");
    config.sync_period_secs = 15;
    config.save(&path).unwrap();

    let loaded = CarrierConfig::load(&path).unwrap();
    assert_eq!(loaded.server_url, "https://talk.example.org");
    assert_eq!(loaded.sync_period_secs, 15);
}

#[test]
fn load_rejects_bad_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "server_url = [not toml").unwrap();
    assert!(matches!(
        CarrierConfig::load(&path),
        Err(ClientError::Config(_))
    ));
}

#[test]
fn realtime_url_is_derived_from_server_url() {
    let config = CarrierConfig::for_server("https://talk.example.org/");
    assert_eq!(
        config.resolved_realtime_url(),
        "wss://talk.example.org/ws/chat"
    );

    let config = CarrierConfig::for_server("http://localhost:8080");
    assert_eq!(
        config.resolved_realtime_url(),
        "ws://localhost:8080/ws/chat"
    );
}

#[test]
fn explicit_realtime_url_wins() {
    let mut config = CarrierConfig::for_server("https://talk.example.org");
    config.realtime_url = Some("wss://rt.example.org/ws".into());
    assert_eq!(config.resolved_realtime_url(), "wss://rt.example.org/ws");
}

#[test]
fn link_config_mirrors_knobs() {
    let mut config = CarrierConfig::for_server("http://localhost:8080");
    config.heartbeat_interval_ms = 5000;
    config.queue_capacity = 7;
    let link = config.link_config();
    assert_eq!(link.heartbeat_interval, Duration::from_millis(5000));
    assert_eq!(link.queue_capacity, 7);
    assert_eq!(link.url, "ws://localhost:8080/ws/chat");
}
