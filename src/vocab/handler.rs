//! HTTP Handlers for words and word progress

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::{Vocab, clean_term};
use crate::error::{ApiError, parse_id};
use crate::handler::{AppState, success};

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub term: Option<String>,
}

pub async fn list_words(State(state): State<AppState>) -> Response {
    let lib = Vocab::new(state.db.connection());

    match lib.list_words_with_progress(state.demo_user_id).await {
        Ok(words) => success(words),
        Err(e) => ApiError::internal("failed to list words", e).into_response(),
    }
}

pub async fn get_word(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let word_id = match parse_id(&raw_id, "wordId") {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let lib = Vocab::new(state.db.connection());

    match lib.get_word_with_progress(word_id, state.demo_user_id).await {
        Ok(Some(word)) => success(word),
        Ok(None) => ApiError::not_found("Word not found").into_response(),
        Err(e) => ApiError::internal("failed to get word", e).into_response(),
    }
}

pub async fn lookup_word(State(state): State<AppState>, Query(params): Query<LookupParams>) -> Response {
    let term = params.term.unwrap_or_default();
    if clean_term(&term).is_empty() {
        return ApiError::validation("term is required", Some("term")).into_response();
    }
    let lib = Vocab::new(state.db.connection());

    match lib.lookup_term(&term, state.demo_user_id).await {
        Ok(Some(word)) => success(word),
        Ok(None) => ApiError::not_found("Word not found").into_response(),
        Err(e) => ApiError::internal("failed to look up word", e).into_response(),
    }
}

/// Marks the word behind a progress row as mastered. The request body is ignored.
pub async fn update_word_progress(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let user_word_id = match parse_id(&raw_id, "userWordId") {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let lib = Vocab::new(state.db.connection());

    let _guard = state.db.tx_guard().await;
    match lib.mark_mastered(user_word_id).await {
        Ok(Some(progress)) => {
            tracing::info!(
                user_word_id,
                times_seen = progress.times_seen,
                "word progress marked mastered"
            );
            success(progress)
        }
        Ok(None) => ApiError::not_found("Word progress not found").into_response(),
        Err(e) => ApiError::internal("failed to update word progress", e).into_response(),
    }
}

pub async fn progress_summary(State(state): State<AppState>) -> Response {
    let lib = Vocab::new(state.db.connection());

    match lib.progress_summary(state.demo_user_id).await {
        Ok(summary) => success(summary),
        Err(e) => ApiError::internal("failed to summarise word progress", e).into_response(),
    }
}
