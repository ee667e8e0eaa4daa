// Account and session error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::ErrorResponse;

/// Failures surfaced by the account lifecycle.
///
/// Every variant maps to a fixed client message and a machine-readable kind tag.
/// The payloads of `UploadFailure` and `InternalError` are for logs only.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad or missing input shape
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username or email already belongs to another account
    #[error("Account already exists")]
    Conflict,

    #[error("Account not found")]
    NotFound,

    /// Bad credentials, or an invalid, rotated or expired token
    #[error("Unauthorized")]
    Unauthorized,

    /// The media host failed or returned no usable url
    #[error("Media upload failed: {0}")]
    UploadFailure(String),

    /// Storage or token-signing failure
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Machine-readable kind tag
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::ValidationError(_) => "VALIDATION_ERROR",
            AuthError::Conflict => "CONFLICT",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::UploadFailure(_) => "UPLOAD_FAILURE",
            AuthError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict => StatusCode::CONFLICT,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::UploadFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message, fixed per kind
    pub fn error_message(&self) -> &'static str {
        match self {
            AuthError::ValidationError(_) => "Request validation failed",
            AuthError::Conflict => "User already exists",
            AuthError::NotFound => "User not found",
            AuthError::Unauthorized => "Unauthorized",
            AuthError::UploadFailure(_) => "Failed to upload media",
            AuthError::InternalError(_) => "An internal server error occurred",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let details = match &self {
            AuthError::ValidationError(msg) => {
                debug!("Validation error: {}", msg);
                Some(serde_json::Value::String(msg.clone()))
            }
            AuthError::Conflict | AuthError::NotFound => {
                debug!("{}", self);
                None
            }
            AuthError::Unauthorized => {
                warn!("Unauthorized request rejected");
                None
            }
            AuthError::UploadFailure(msg) => {
                error!("Media upload failure: {}", msg);
                None
            }
            AuthError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                None
            }
        };

        ErrorResponse::new(self.kind(), self.error_message(), details)
            .into_response_with(self.status_code())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::UploadFailure("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = AuthError::InternalError("relation \"accounts\" does not exist".into());
        assert_eq!(err.kind(), "INTERNAL_ERROR");
        assert!(!err.error_message().contains("accounts"));

        let err = AuthError::UploadFailure("401 from media host".into());
        assert!(!err.error_message().contains("401"));
    }

    #[tokio::test]
    async fn test_response_body_carries_kind_tag() {
        let response = AuthError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error_code, "UNAUTHORIZED");
        assert_eq!(body.message, "Unauthorized");
        assert!(body.details.is_none());
    }
}
