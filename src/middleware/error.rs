//! Error response formatting middleware
//!
//! Provides standardized error responses with consistent JSON structure,
//! HTTP status codes, and the CORS headers every boundary response carries.

use crate::error::AppError;
use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Standardized error response structure
///
/// This is returned to clients for all error cases. The wire shape is a
/// single `error` string so existing storefront clients keep parsing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

impl ErrorResponse {
    /// Create a new error response from an AppError
    pub fn from_app_error(error: &AppError) -> Self {
        Self {
            error: error.user_message(),
        }
    }

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Add CORS headers for the public API
///
/// Wildcard origin with the header allow-list the storefront sends.
pub fn add_cors_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".parse().unwrap());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "authorization, x-client-info, apikey, content-type"
            .parse()
            .unwrap(),
    );
}

/// Implement IntoResponse for AppError to automatically convert errors
/// into HTTP responses with proper status codes and JSON formatting
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Log the error with context
        if status_code.is_server_error() {
            tracing::error!(
                error = ?self,
                code = ?self.error_code(),
                request_id = ?self.request_id,
                status = %status_code.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::warn!(
                error = ?self,
                code = ?self.error_code(),
                request_id = ?self.request_id,
                status = %status_code.as_u16(),
                "Client error occurred"
            );
        }

        let mut headers = HeaderMap::new();
        add_cors_headers(&mut headers);

        let error_response = ErrorResponse::from_app_error(&self);
        (status_code, headers, Json(error_response)).into_response()
    }
}

/// Build a standardized JSON error response for handlers that return early.
pub fn json_error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let mut headers = HeaderMap::new();
    add_cors_headers(&mut headers);

    (status, headers, Json(ErrorResponse::new(message))).into_response()
}

/// Handle OPTIONS preflight requests
pub async fn options_preflight() -> Response {
    let mut headers = HeaderMap::new();
    add_cors_headers(&mut headers);
    (StatusCode::NO_CONTENT, headers).into_response()
}
