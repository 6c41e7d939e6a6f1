use crate::services::upload::StationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    /// Fetch, transcode, upload or registration failed
    #[error("{0}")]
    Downstream(String),

    /// The station manager answered with JSON we cannot use
    #[error("{0}")]
    UpstreamShape(String),
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Downstream(_) | AppError::UpstreamShape(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StationError> for AppError {
    fn from(err: StationError) -> Self {
        match err {
            StationError::Decode(_) => AppError::UpstreamShape(err.to_string()),
            other => AppError::Downstream(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();

        match &self {
            AppError::Downstream(msg) => tracing::error!("Downstream error: {}", msg),
            AppError::UpstreamShape(msg) => tracing::error!("Upstream shape error: {}", msg),
            AppError::Unauthorized(_) | AppError::Validation(_) => {}
        }

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Downstream("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::UpstreamShape("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_station_error_classification() {
        let shape: AppError = StationError::Decode("expected value".into()).into();
        assert!(matches!(shape, AppError::UpstreamShape(_)));
        assert_eq!(shape.to_string(), "Failed to parse JSON response: expected value");

        let downstream: AppError = StationError::Status {
            context: "AzuraCast API error",
            status: 502,
            body: "bad gateway".into(),
        }
        .into();
        assert!(matches!(downstream, AppError::Downstream(_)));
        assert_eq!(downstream.to_string(), "AzuraCast API error: 502 bad gateway");
    }
}
