//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use casa_engine::RemoteError;
use serde::Serialize;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] casa_engine::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<RemoteError> for AppError {
    fn from(e: RemoteError) -> Self {
        AppError::Engine(e.into())
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Status code for a rejected session action.
fn engine_status(e: &casa_engine::Error) -> StatusCode {
    use casa_engine::Error;

    match e {
        Error::IndexOutOfRange { .. } | Error::RecordNotFound(_) => StatusCode::NOT_FOUND,
        Error::FeaturedLimit { .. }
        | Error::NotPersisted(_)
        | Error::DuplicateUrl { .. } => StatusCode::CONFLICT,
        Error::Remote(RemoteError::NotFound(_)) => StatusCode::NOT_FOUND,
        Error::Remote(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Engine(e) => {
                let status = engine_status(e);
                if status.is_server_error() {
                    tracing::error!("Remote store error: {:?}", e);
                    (status, "Remote store unavailable".to_string(), Some(e.to_string()))
                } else {
                    tracing::warn!("Engine error: {:?}", e);
                    (status, e.to_string(), None)
                }
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
