//! Application error handling
//!
//! Converts engine and internal errors into HTTP responses. Rejections all
//! look alike to the client; server-side failures are logged and reported
//! with a generic message.

use authgate_shared::{AuthError, ErrorDetail, ErrorResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(err) if err.is_rejection() => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::StorageUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            ApiError::Auth(err @ AuthError::InvalidCredentials) => (err.code(), err.to_string()),
            ApiError::Auth(err) if err.is_rejection() => {
                (err.code(), "Invalid or expired session".to_string())
            }
            ApiError::Auth(err @ AuthError::StorageUnavailable(reason)) => {
                error!("Backend unavailable: {}", reason);
                (err.code(), "Authentication backend unavailable".to_string())
            }
            ApiError::Auth(err) => {
                error!("Internal error: {}", err);
                (err.code(), "An internal error occurred".to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field: None,
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_rejections_are_401() {
        for err in [AuthError::InvalidCredentials, AuthError::Unauthorized, AuthError::MalformedToken] {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_storage_failure_is_503() {
        let err = ApiError::from(AuthError::StorageUnavailable("db down".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_internal_failure_is_500() {
        let err = ApiError::from(AuthError::Internal("signing failed".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_body_codes_come_from_auth_error() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::Unauthorized,
            AuthError::StorageUnavailable("db down".to_string()),
            AuthError::Internal("signing failed".to_string()),
        ] {
            let expected = err.code();
            let (_, body) = body_of(ApiError::from(err)).await;
            assert_eq!(body["error"]["code"], expected);
        }
    }

    #[tokio::test]
    async fn test_malformed_and_revoked_look_identical() {
        let malformed = body_of(ApiError::from(AuthError::MalformedToken)).await;
        let revoked = body_of(ApiError::from(AuthError::Unauthorized)).await;
        assert_eq!(malformed, revoked);
    }

    #[tokio::test]
    async fn test_server_failures_hide_details() {
        let (_, body) = body_of(ApiError::from(AuthError::StorageUnavailable("10.0.0.5:5432".to_string()))).await;
        assert!(!body["error"]["message"].as_str().unwrap().contains("10.0.0.5"));
    }
}
