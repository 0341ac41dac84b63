use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use super::{PassageResponse, Reading, tokenize};
use crate::error::{ApiError, parse_id};
use crate::handler::{AppState, success};
use crate::vocab::Vocab;

pub async fn list_passages(State(state): State<AppState>) -> Response {
    let lib = Reading::new(state.db.connection());

    match lib.list_passages().await {
        Ok(passages) => success(passages.into_iter().map(PassageResponse::from).collect::<Vec<_>>()),
        Err(e) => ApiError::internal("failed to list passages", e).into_response(),
    }
}

pub async fn get_passage(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let passage_id = match parse_id(&raw_id, "id") {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let lib = Reading::new(state.db.connection());

    match lib.get_passage(passage_id).await {
        Ok(Some(passage)) => success(PassageResponse::from(passage)),
        Ok(None) => ApiError::not_found("Passage not found").into_response(),
        Err(e) => ApiError::internal("failed to get passage", e).into_response(),
    }
}

pub async fn list_passage_tokens(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let passage_id = match parse_id(&raw_id, "id") {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let conn = state.db.connection();

    let passage = match Reading::new(conn).get_passage(passage_id).await {
        Ok(Some(passage)) => passage,
        Ok(None) => return ApiError::not_found("Passage not found").into_response(),
        Err(e) => return ApiError::internal("failed to get passage", e).into_response(),
    };

    match Vocab::new(conn).list_words().await {
        Ok(words) => success(tokenize(&passage.body_text, &words)),
        Err(e) => ApiError::internal("failed to list words", e).into_response(),
    }
}
