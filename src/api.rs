//! Endpoint declarations shared by the route table, the handlers and the tests.
//!
//! Paths use axum's `:param` syntax so the same string both registers the route
//! and, through [`build_url`], produces a concrete request URL.

use axum::http::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
}

impl Endpoint {
    const fn new(method: Method, path: &'static str) -> Self {
        Endpoint { method, path }
    }

    pub fn url(&self, params: &[(&str, &str)]) -> String {
        build_url(self.path, params)
    }
}

pub mod health {
    use super::*;

    pub const CHECK: Endpoint = Endpoint::new(Method::GET, "/");
}

pub mod words {
    use super::*;

    pub const LIST: Endpoint = Endpoint::new(Method::GET, "/api/words");
    pub const LOOKUP: Endpoint = Endpoint::new(Method::GET, "/api/words/lookup");
    pub const GET: Endpoint = Endpoint::new(Method::GET, "/api/words/:wordId");
}

pub mod word_progress {
    use super::*;

    pub const UPDATE: Endpoint = Endpoint::new(Method::PATCH, "/api/word-progress/:userWordId");
    /// Kept off the `/api/word-progress/` prefix so it never shadows a progress id.
    pub const SUMMARY: Endpoint = Endpoint::new(Method::GET, "/api/progress/summary");
}

pub mod reading_passages {
    use super::*;

    pub const LIST: Endpoint = Endpoint::new(Method::GET, "/api/reading-passages");
    pub const GET: Endpoint = Endpoint::new(Method::GET, "/api/reading-passages/:id");
    pub const WORDS: Endpoint = Endpoint::new(Method::GET, "/api/reading-passages/:id/words");
}

pub mod users {
    use super::*;

    pub const CREATE: Endpoint = Endpoint::new(Method::POST, "/api/users");
    pub const ME: Endpoint = Endpoint::new(Method::GET, "/api/users/me");
    pub const GET: Endpoint = Endpoint::new(Method::GET, "/api/users/:id");
}

pub mod conversations {
    use super::*;

    pub const LIST: Endpoint = Endpoint::new(Method::GET, "/api/conversations");
    pub const CREATE: Endpoint = Endpoint::new(Method::POST, "/api/conversations");
    pub const GET: Endpoint = Endpoint::new(Method::GET, "/api/conversations/:id");
    pub const DELETE: Endpoint = Endpoint::new(Method::DELETE, "/api/conversations/:id");
    pub const ADD_MESSAGE: Endpoint = Endpoint::new(Method::POST, "/api/conversations/:id/messages");
}

/// Error payload for every 4xx/5xx response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// Substitutes `:name` segments in `path` with the matching (url-encoded) value.
/// Unknown keys are ignored and unmatched placeholders are left in place.
pub fn build_url(path: &str, params: &[(&str, &str)]) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| urlencoding::encode(value).into_owned())
                .unwrap_or_else(|| segment.to_string()),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
