use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use jobscout_core::error::AppError;
use jobscout_core::models::{SearchFailure, processing_seconds};

use crate::dto::ErrorResponse;

/// Wrapper so we can implement `IntoResponse` for `AppError`.
pub struct ApiError {
    pub error: AppError,
    /// Set once the request reached the orchestrator.
    pub processing_time: Option<f64>,
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            processing_time: None,
        }
    }
}

impl From<SearchFailure> for ApiError {
    fn from(failure: SearchFailure) -> Self {
        Self {
            error: failure.error,
            processing_time: Some(processing_seconds(failure.elapsed)),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.error {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            e if e.is_transport() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.error, "Search failed");
        }

        let body = ErrorResponse {
            success: false,
            error: self.error.to_string(),
            processing_time: self.processing_time,
        };

        (status, axum::Json(body)).into_response()
    }
}
