#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use lingo::db::Database;
use lingo::handler::AppState;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

pub const DEMO_USER_ID: i64 = 1;

pub async fn empty_db() -> Arc<Database> {
    Arc::new(Database::open_local(":memory:").await.expect("in-memory database"))
}

pub async fn seeded_db() -> Arc<Database> {
    let db = empty_db().await;
    db.seed_data(DEMO_USER_ID).await.expect("seed");
    db
}

pub fn app_for(db: Arc<Database>) -> Router {
    lingo::app(AppState {
        db,
        demo_user_id: DEMO_USER_ID,
    })
}

pub async fn create_test_app() -> Router {
    app_for(seeded_db().await)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

pub async fn send_json<T: DeserializeOwned>(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, T) {
    let (status, bytes) = send(app, method, uri, body).await;
    let parsed = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("bad json from {uri} ({status}): {e}: {}", String::from_utf8_lossy(&bytes)));
    (status, parsed)
}

/// Sends a raw body, optionally without a content type, for exercising body rejections.
pub async fn send_raw(app: &Router, method: Method, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder.body(Body::from(body.to_owned())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}
