use axum::{
    Router,
    routing::{get, post},
};

use super::handler;
use crate::api;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            api::conversations::LIST.path,
            get(handler::list_conversations).post(handler::create_conversation),
        )
        .route(
            api::conversations::GET.path,
            get(handler::get_conversation).delete(handler::delete_conversation),
        )
        .route(api::conversations::ADD_MESSAGE.path, post(handler::add_message))
}
