use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::api::ErrorBody;

/// Failure buckets surfaced at the route boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("ValidationError: {message}")]
    Validation { message: String, field: Option<String> },
    #[error("NotFound: {0}")]
    NotFound(String),
    #[error("InternalError: {context}: {error}")]
    Internal {
        context: &'static str,
        error: anyhow::Error,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        ApiError::Validation {
            message: message.into(),
            field: field.map(str::to_owned),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(context: &'static str, error: anyhow::Error) -> Self {
        ApiError::Internal { context, error }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation { message, field } => ErrorBody { message, field },
            ApiError::NotFound(message) => ErrorBody { message, field: None },
            ApiError::Internal { context, error } => {
                tracing::error!(error = %crate::unpack_error(&*error), "{}", context);
                ErrorBody {
                    message: "Internal server error".to_string(),
                    field: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        let field = missing_field(&message).map(str::to_owned);
        ApiError::Validation { message, field }
    }
}

/// Pulls the field name out of serde's "missing field `x`" message.
fn missing_field(message: &str) -> Option<&str> {
    let (_, rest) = message.split_once("missing field `")?;
    rest.split_once('`').map(|(field, _)| field)
}

/// Decodes an optional JSON body. An empty body yields `T::default()`.
pub fn parse_optional_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        let message = format!("Failed to parse the request body as JSON: {}", e);
        let field = missing_field(&message).map(str::to_owned);
        ApiError::Validation { message, field }
    })
}

/// Parses a numeric path identifier. Zero, negatives and non-numbers are rejected.
pub fn parse_id(raw: &str, field: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation(format!("Invalid {}", field), Some(field))),
    }
}
