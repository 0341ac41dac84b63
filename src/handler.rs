use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::info;

use crate::api::StatusBody;
use crate::db::Database;
use crate::error::{ApiError, parse_id};
use crate::model::CreateUser;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// No authentication yet: every request acts as this user.
    pub demo_user_id: i64,
}

pub fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(StatusBody {
        status: "ok".to_string(),
    })
}

pub async fn get_current_user(State(state): State<AppState>) -> Response {
    match state.db.get_user(state.demo_user_id).await {
        Ok(Some(user)) => success(user),
        Ok(None) => ApiError::not_found("User not found").into_response(),
        Err(e) => ApiError::internal("failed to get current user", e).into_response(),
    }
}

pub async fn get_user(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let user_id = match parse_id(&raw_id, "id") {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match state.db.get_user(user_id).await {
        Ok(Some(user)) => success(user),
        Ok(None) => ApiError::not_found("User not found").into_response(),
        Err(e) => ApiError::internal("failed to get user", e).into_response(),
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return ApiError::validation("A valid email is required", Some("email")).into_response();
    }
    if payload.display_name.trim().is_empty() {
        return ApiError::validation("displayName is required", Some("displayName")).into_response();
    }

    match state.db.create_user(&payload).await {
        Ok(Some(user)) => {
            info!(user_id = user.user_id, "user created");
            created(user)
        }
        Ok(None) => ApiError::validation("Email is already registered", Some("email")).into_response(),
        Err(e) => ApiError::internal("failed to create user", e).into_response(),
    }
}
