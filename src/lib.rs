use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use std::error::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::handler::AppState;

pub mod adventure;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod model;
pub mod reading;
pub mod vocab;

/// Full route table for the service.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route(api::health::CHECK.path, get(handler::healthcheck))
        .route(api::users::CREATE.path, post(handler::create_user))
        .route(api::users::ME.path, get(handler::get_current_user))
        .route(api::users::GET.path, get(handler::get_user))
        .merge(vocab::routes())
        .merge(reading::routes())
        .merge(adventure::routes())
        .layer(cors)
        .with_state(state)
}

pub fn unpack_error(err: &dyn Error) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
