use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything the collection layer and the HTTP surface can fail with.
/// Validation errors are raised before any store access; store errors during
/// the atomic batch abort the whole operation with no partial effect.
#[derive(Error, Debug)]
pub enum Error {
    #[error("collection not found: {0}")]
    NotFound(String),

    #[error("a collection named {0:?} already exists")]
    DuplicateName(String),

    #[error("invalid collection name: {0}")]
    InvalidName(String),

    #[error("storage error: {0}")]
    Store(#[from] sled::Error),

    #[error("corrupt document: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateName(_) => StatusCode::CONFLICT,
            Error::InvalidName(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            Error::Store(_) | Error::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Same error envelope the web client already parses
        let body = Json(json!({ "error": { "message": self.to_string() } }));
        (status, body).into_response()
    }
}
