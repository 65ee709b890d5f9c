#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use qdesk_core::dispatch::EventEnvelope;
use qdesk_events::{EventHub, Subscription};
use serde_json::Value;
use tower::ServiceExt;

use qdesk_api::config::ServerConfig;
use qdesk_api::router::build_app_router;
use qdesk_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        ..ServerConfig::default()
    }
}

/// Application state over a fresh in-memory database.
pub async fn test_state_with(config: ServerConfig) -> AppState {
    let pool = qdesk_db::create_memory_pool()
        .await
        .expect("in-memory pool should open");
    AppState {
        pool,
        hub: Arc::new(EventHub::new(config.subscriber_buffer)),
        config: Arc::new(config),
    }
}

pub async fn test_state() -> AppState {
    test_state_with(test_config()).await
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(state: &AppState) -> Router {
    build_app_router(state.clone(), &state.config)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, json: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(json)).await
}

pub async fn put_json(app: &Router, uri: &str, json: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(json)).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Issue a ticket for the seeded `General` service type.
pub async fn issue_ticket(app: &Router) -> Value {
    let response = post_json(app, "/api/v1/queue/tickets", serde_json::json!({ "service_type_id": 1 })).await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"].clone()
}

/// Wait briefly for the next event on a hub subscription.
pub async fn next_event(sub: &mut Subscription) -> Arc<EventEnvelope> {
    tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .expect("event should arrive")
        .expect("subscription open")
}

/// Drain whatever is already buffered on a subscription.
pub fn drain(sub: &mut Subscription) -> Vec<Arc<EventEnvelope>> {
    use futures::FutureExt;
    let mut events = Vec::new();
    while let Some(Some(event)) = sub.recv().now_or_never() {
        events.push(event);
    }
    events
}
