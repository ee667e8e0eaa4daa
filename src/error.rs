// Error response shape shared by every endpoint

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Consistent error response structure
///
/// Provides both a machine-readable `error_code` and a human-readable `message`.
/// The message is fixed per error kind so internal details never reach clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "UNAUTHORIZED")
    #[schema(example = "UNAUTHORIZED")]
    pub error_code: String,

    /// Human-readable error message
    #[schema(example = "Unauthorized")]
    pub message: String,

    /// Optional details about the caller's own input (validation failures only)
    /// Omitted from JSON when None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_code: &str, message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.to_string(),
            details,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Pair the body with a status code into a full response
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_omitted_when_none() {
        let body = ErrorResponse::new("NOT_FOUND", "Account not found", None);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error_code"], "NOT_FOUND");
        assert_eq!(json["message"], "Account not found");
        assert!(json.get("details").is_none());
        assert!(json["timestamp"].as_str().is_some());
    }

    #[test]
    fn test_details_serialized_when_present() {
        let body = ErrorResponse::new(
            "VALIDATION_ERROR",
            "Request validation failed",
            Some(serde_json::json!("username: must not be blank")),
        );
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["details"], "username: must not be blank");
    }
}
