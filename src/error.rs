use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, AppError>;

/// Application error taxonomy. Everything a request handler can surface
/// maps onto one of these; broker-side delivery failures are deliberately
/// absent (they are logged and never propagated to the sender).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("sender is not a participant of this conversation")]
    NotParticipant,

    #[error("a block exists between the participants")]
    Blocked,

    #[error("message has no text and no attachment")]
    EmptyPayload,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("storage temporarily unavailable: {0}")]
    TransientStoreFailure(String),

    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotParticipant | AppError::Blocked => StatusCode::FORBIDDEN,
            AppError::EmptyPayload | AppError::BadRequest(_) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TransientStoreFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable code for clients that switch on error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotParticipant => "not_participant",
            AppError::Blocked => "blocked",
            AppError::EmptyPayload => "empty_payload",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::TransientStoreFailure(_) => "transient_store_failure",
            AppError::Validation(_) => "validation",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {}", self);
        } else {
            tracing::debug!(code = self.code(), "request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::TransientStoreFailure(err.to_string())
    }
}
