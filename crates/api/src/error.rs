//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use executor::ExecutorError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The statement to run is empty.
    MissingSql,
    /// The statement is not a SELECT.
    DisallowedStatement,
    /// The backend's driver is not available; carries the client-facing reason.
    DriverUnavailable(String),
    /// Database credentials are not (fully) configured.
    ConfigurationMissing,
    /// Connecting or running the statement failed.
    Executor(ExecutorError),
}

impl ApiError {
    fn reason(&self) -> &'static str {
        match self {
            ApiError::MissingSql => "missing_sql",
            ApiError::DisallowedStatement => "disallowed_statement",
            ApiError::DriverUnavailable(_) => "driver_unavailable",
            ApiError::ConfigurationMissing => "configuration_missing",
            ApiError::Executor(_) => "executor",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        metrics::counter!("requests_rejected_total", "reason" => self.reason()).increment(1);

        let (status, message) = match self {
            ApiError::MissingSql => (StatusCode::BAD_REQUEST, "missing sql".to_string()),
            ApiError::DisallowedStatement => (
                StatusCode::BAD_REQUEST,
                "only SELECT allowed in this demo".to_string(),
            ),
            ApiError::DriverUnavailable(reason) => {
                tracing::warn!(%reason, "query backend unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, reason)
            }
            ApiError::ConfigurationMissing => (
                StatusCode::BAD_REQUEST,
                "db credentials not configured".to_string(),
            ),
            ApiError::Executor(err) => {
                tracing::error!(error = %err, "query execution failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<ExecutorError> for ApiError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::Unavailable(reason) => ApiError::DriverUnavailable(reason),
            other => ApiError::Executor(other),
        }
    }
}
