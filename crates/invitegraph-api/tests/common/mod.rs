//! Shared helpers for the API integration tests.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use invitegraph_upstream::wire::WireUser;
use invitegraph_upstream::MemoryUpstream;

/// Number of concurrent clients in the concurrency tests.
pub const CONCURRENT_CLIENT_COUNT: usize = 25;

pub fn user(profile_id: u64, username: &str) -> WireUser {
    WireUser {
        id: profile_id + 1000,
        profile_id: Some(profile_id),
        username: Some(username.to_string()),
        display_name: Some(format!("{username} display")),
        avatar_url: Some(format!("https://avatars.example/{username}.png")),
        score: Some(1000 + profile_id as i64),
        ..Default::default()
    }
}

/// Builds an upstream from `(inviter, invitee)` pairs, creating a user named
/// `user<id>` for every profile mentioned.
pub fn upstream_with_invitations(pairs: &[(u64, u64)]) -> Arc<MemoryUpstream> {
    let upstream = MemoryUpstream::new_shared();
    for &(inviter, invitee) in pairs {
        for id in [inviter, invitee] {
            upstream.insert_user(user(id, &format!("user{id}")));
        }
    }
    for &(inviter, invitee) in pairs {
        upstream.add_invitation(inviter, invitee);
    }
    upstream
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// Profile ids of the graph's nodes, in response order.
pub fn node_ids(graph: &Value) -> Vec<u64> {
    graph["nodes"]
        .as_array()
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(|n| n["profileId"].as_u64())
                .collect()
        })
        .unwrap_or_default()
}

/// `(profileId, level)` for every node.
pub fn node_levels(graph: &Value) -> Vec<(u64, u64)> {
    graph["nodes"]
        .as_array()
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(|n| Some((n["profileId"].as_u64()?, n["level"].as_u64()?)))
                .collect()
        })
        .unwrap_or_default()
}
