//! API error type and its mapping onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use todo_domain::DomainError;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The addressed todo does not exist.
    #[error("Not found")]
    NotFound,

    /// The request was understood but its content is invalid.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The database failed; details are logged, not returned.
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// An HTML template failed to render.
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // no envelope on 404; clients only look at the status
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            ApiError::Store(ref e) => {
                tracing::error!(error = %e, "store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            ApiError::Render(ref e) => {
                tracing::error!(error = %e, "template rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}
