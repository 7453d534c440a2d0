//! Nerala RAG Server
//!
//! HTTP boundary for the lexicon assistant: request validation, routing
//! and the JSON error surface.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nerala_core::Language;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Unsupported language")]
    UnsupportedLanguage(String),

    #[error("Endpoint not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request too large")]
    PayloadTooLarge,

    #[error("Unsupported media type")]
    UnsupportedMediaType,
}

impl ServerError {
    /// Longer explanation sent alongside `error`
    fn message(&self) -> Option<&'static str> {
        match self {
            ServerError::PayloadTooLarge => Some("Request size exceeds limit"),
            ServerError::UnsupportedMediaType => Some("Content-Type must be application/json"),
            _ => None,
        }
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) | ServerError::UnsupportedLanguage(_) => {
                StatusCode::BAD_REQUEST
            },
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        let body = match &self {
            ServerError::UnsupportedLanguage(language) => serde_json::json!({
                "error": self.to_string(),
                "details": {
                    "language": language,
                    "supported": Language::all().iter().map(|l| l.as_str()).collect::<Vec<_>>(),
                },
            }),
            _ => match self.message() {
                Some(message) => {
                    serde_json::json!({ "error": self.to_string(), "message": message })
                },
                None => serde_json::json!({ "error": self.to_string() }),
            },
        };
        (status, Json(body)).into_response()
    }
}
