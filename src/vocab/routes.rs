use axum::{
    Router,
    routing::{get, patch},
};

use super::handler;
use crate::api;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(api::words::LIST.path, get(handler::list_words))
        .route(api::words::LOOKUP.path, get(handler::lookup_word))
        .route(api::words::GET.path, get(handler::get_word))
        .route(api::word_progress::SUMMARY.path, get(handler::progress_summary))
        .route(api::word_progress::UPDATE.path, patch(handler::update_word_progress))
}
