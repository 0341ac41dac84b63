use axum::{Router, routing::get};

use super::handler;
use crate::api;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(api::reading_passages::LIST.path, get(handler::list_passages))
        .route(api::reading_passages::GET.path, get(handler::get_passage))
        .route(api::reading_passages::WORDS.path, get(handler::list_passage_tokens))
}
