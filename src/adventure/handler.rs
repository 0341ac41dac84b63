use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{Adventure, CreateConversation, CreateMessage, Role};
use crate::error::{ApiError, parse_id, parse_optional_body};
use crate::handler::{AppState, created, success};

/// The body is optional; a bare POST starts a session with the default title.
pub async fn create_conversation(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: CreateConversation = match parse_optional_body(&body) {
        Ok(payload) => payload,
        Err(e) => return e.into_response(),
    };
    let lib = Adventure::new(&state.db);

    match lib.create_conversation(payload).await {
        Ok(conversation) => {
            tracing::info!(conversation_id = conversation.id, "adventure session started");
            created(conversation)
        }
        Err(e) => ApiError::internal("failed to create conversation", e).into_response(),
    }
}

pub async fn list_conversations(State(state): State<AppState>) -> Response {
    let lib = Adventure::new(&state.db);

    match lib.list_conversations().await {
        Ok(conversations) => success(conversations),
        Err(e) => ApiError::internal("failed to list conversations", e).into_response(),
    }
}

pub async fn get_conversation(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let id = match parse_id(&raw_id, "id") {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let lib = Adventure::new(&state.db);

    match lib.get_conversation_with_messages(id).await {
        Ok(Some(conversation)) => success(conversation),
        Ok(None) => ApiError::not_found("Conversation not found").into_response(),
        Err(e) => ApiError::internal("failed to get conversation", e).into_response(),
    }
}

pub async fn delete_conversation(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let id = match parse_id(&raw_id, "id") {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let lib = Adventure::new(&state.db);

    match lib.delete_conversation(id).await {
        Ok(true) => (StatusCode::NO_CONTENT, ()).into_response(),
        Ok(false) => ApiError::not_found("Conversation not found").into_response(),
        Err(e) => ApiError::internal("failed to delete conversation", e).into_response(),
    }
}

/// Stores a player turn. Generating the narrator's reply is left to the external provider.
pub async fn add_message(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<CreateMessage>, JsonRejection>,
) -> Response {
    let id = match parse_id(&raw_id, "id") {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };
    let content = payload.content.trim();
    if content.is_empty() {
        return ApiError::validation("content is required", Some("content")).into_response();
    }
    let lib = Adventure::new(&state.db);

    match lib.add_message(id, Role::User, content).await {
        Ok(Some(message)) => created(message),
        Ok(None) => ApiError::not_found("Conversation not found").into_response(),
        Err(e) => ApiError::internal("failed to add message", e).into_response(),
    }
}
