//! API error types.

use crate::services::ServiceError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] pccs_core::Error),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("metadata error: {0}")]
    Metadata(#[from] pccs_metadata::MetadataError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(e) if e.is_invalid_request() => "invalid_request",
            Self::Service(ServiceError::NotFound(_)) => "not_found",
            Self::Service(ServiceError::Cache(_) | ServiceError::Config(_)) => "internal_error",
            Self::Service(_) => "upstream_failure",
            Self::InvalidRequest(_) | Self::Metadata(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.code() {
            "invalid_request" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "upstream_failure" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_map_to_bad_request() {
        for err in [
            pccs_core::Error::MissingUri,
            pccs_core::Error::UriRejected("https://evil.example.com/cert".to_string()),
            pccs_core::Error::UnsupportedApiVersion("v5".to_string()),
            pccs_core::Error::InvalidUpdateType("LATE".to_string()),
        ] {
            let err = ApiError::from(err);
            assert_eq!(err.code(), "invalid_request");
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_upstream_errors_map_to_bad_gateway() {
        let err = ApiError::from(ServiceError::UpstreamStatus {
            status: 503,
            body: String::new(),
        });
        assert_eq!(err.code(), "upstream_failure");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err = ApiError::from(ServiceError::MissingHeader("X"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_upstream_body_is_not_echoed() {
        let err = ApiError::from(ServiceError::UpstreamStatus {
            status: 500,
            body: "internal trace: db=pcs-prod-7".to_string(),
        });

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "upstream_failure");
        assert_eq!(body["message"], "upstream returned status 500");
    }

    #[test]
    fn test_upstream_not_found_maps_to_not_found() {
        let err = ApiError::from(ServiceError::NotFound("qe".to_string()));
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_config_error_is_internal() {
        let err = ApiError::from(pccs_core::Error::Config("bad".to_string()));
        assert_eq!(err.code(), "internal_error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
