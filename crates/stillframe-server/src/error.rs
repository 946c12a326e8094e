//! Stillframe server — error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use stillframe_content::domain::error::ContentError;
use stillframe_core::error::StageError;
use thiserror::Error;

/// Startup and runtime errors for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The story manifest could not be ingested.
    #[error("story error: {0}")]
    Content(#[from] ContentError),

    /// Reading the story, binding the socket or serving failed.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `StageError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub StageError);

impl From<StageError> for ApiError {
    fn from(err: StageError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            StageError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            StageError::FadeInProgress(_) => (StatusCode::CONFLICT, "fade_in_progress"),
            StageError::TransitionInFlight(_) => (StatusCode::CONFLICT, "transition_in_flight"),
            StageError::PossessionInFlight => (StatusCode::CONFLICT, "possession_in_flight"),
            StageError::SessionEnding => (StatusCode::CONFLICT, "session_ending"),
            StageError::FrameOutsideScene { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "frame_outside_scene")
            }
            StageError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            StageError::Infrastructure(_) => (StatusCode::SERVICE_UNAVAILABLE, "stage_unavailable"),
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
