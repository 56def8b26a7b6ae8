// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn client_ids_are_unique() {
    let a = ClientId::generate();
    let b = ClientId::generate();
    assert_ne!(a, b);
}

#[test]
fn client_id_round_trips_through_string() {
    let id = ClientId::generate();
    let parsed: ClientId = id.as_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn client_id_rejects_garbage() {
    let err = "not-a-uuid".parse::<ClientId>().unwrap_err();
    assert!(matches!(err, Error::InvalidClientId(_)));
}

#[test]
fn client_id_serializes_as_bare_string() {
    let id: ClientId = "6f2d3b60-8f0a-4c4e-9d22-5a4e6f1b2c3d".parse().unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"6f2d3b60-8f0a-4c4e-9d22-5a4e6f1b2c3d\"");
}
