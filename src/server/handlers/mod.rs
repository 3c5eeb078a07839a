//! HTTP handlers for the server.

pub mod session;
pub mod templates;

use axum::http::StatusCode;

use crate::error::ReviewQrError;

/// Handler error: status plus a plain-text message.
pub type ApiError = (StatusCode, String);

/// Map a library error to the status the frontend reacts to.
pub fn api_error(e: ReviewQrError) -> ApiError {
    let status = match &e {
        ReviewQrError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ReviewQrError::Resolution(_) | ReviewQrError::Transport(_) => StatusCode::BAD_GATEWAY,
        ReviewQrError::PreconditionNotMet(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewQrError::InvalidTransition { .. } => StatusCode::CONFLICT,
        ReviewQrError::Render(_) | ReviewQrError::Image(_) | ReviewQrError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}
