//! Error types for web handlers.
//!
//! Bridges [`QueryError`] and HTTP responses through Axum's `IntoResponse`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shop_orders_core::QueryError;
use std::fmt;

/// Application error type for web handlers.
///
/// Carries the HTTP status, a stable error code for clients, and a
/// user-facing message. Server errors are logged when rendered.
///
/// # Examples
///
/// ```
/// use axum::http::StatusCode;
/// use shop_orders_core::QueryError;
/// use shop_orders_web::AppError;
///
/// let err = AppError::from(QueryError::invalid_argument("limit must be positive"));
/// assert_eq!(err.status(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.code(), "BAD_REQUEST");
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 404 Not Found error for an unknown route.
    #[must_use]
    pub fn route_not_found(path: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("No route for {path}"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code sent to clients
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// User-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Map query failures onto HTTP semantics.
///
/// Internal details of contract violations stay in the logged source; the
/// client sees a generic message.
impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match &err {
            QueryError::InvalidArgument(message) => Self::bad_request(message.clone()),
            QueryError::StoreUnavailable(_) => {
                Self::unavailable("Order store is unavailable").with_source(err.into())
            }
            QueryError::ScopeClosed => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Association resolved after the read scope closed".to_string(),
                "SCOPE_CLOSED".to_string(),
            )
            .with_source(err.into()),
            QueryError::DanglingReference { .. } | QueryError::Decode(_) => {
                Self::internal("An internal error occurred").with_source(err.into())
            }
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_invalid_argument_keeps_message() {
        let err = AppError::from(QueryError::invalid_argument("offset must be >= 0"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "offset must be >= 0");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_store_unavailable_is_503() {
        let err = AppError::from(QueryError::unavailable("connection refused"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "SERVICE_UNAVAILABLE");
        assert!(!err.message().contains("connection refused"));
    }

    #[test]
    fn test_scope_closed_has_own_code() {
        let err = AppError::from(QueryError::ScopeClosed);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "SCOPE_CLOSED");
    }

    #[test]
    fn test_dangling_reference_is_internal() {
        let err = AppError::from(QueryError::DanglingReference {
            entity: "member",
            id: 4,
        });
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
        assert!(err.source.is_some());
    }

    #[tokio::test]
    async fn test_response_body() {
        let response = AppError::bad_request("limit must be positive").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["message"], "limit must be positive");
    }
}
