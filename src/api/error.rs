//! HTTP mapping of [`Error`].
//!
//! Every failure is rendered as `{"error": {"code", "message", "details"}}`.
//! Unexpected failures become 500 with the underlying error text in
//! `details.cause`.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::{Value, json};

/// Stable error codes carried in the response body.
pub mod codes {
    /// Bad request body or parameter
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    /// Verification status change that is not allowed
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    /// Credentials did not match
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    /// Addressed record does not exist
    pub const NOT_FOUND: &str = "NOT_FOUND";
    /// Uniqueness or reference rule violated
    pub const CONFLICT: &str = "CONFLICT";
    /// Anything else
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

fn constraint_violation(err: &DbErr) -> Option<String> {
    match err.sql_err()? {
        SqlErr::UniqueConstraintViolation(msg) => Some(format!("Duplicate value: {msg}")),
        SqlErr::ForeignKeyConstraintViolation(msg) => {
            Some(format!("Referenced record is missing or still in use: {msg}"))
        }
        _ => None,
    }
}

impl Error {
    /// HTTP status, error code, message and details for this error.
    #[must_use]
    pub fn to_parts(&self) -> (StatusCode, &'static str, String, Value) {
        match self {
            Self::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                codes::VALIDATION_FAILED,
                message.clone(),
                details.clone(),
            ),
            Self::InvalidTransition { from, to } => (
                StatusCode::BAD_REQUEST,
                codes::INVALID_TRANSITION,
                self.to_string(),
                json!({ "from": from, "to": to }),
            ),
            Self::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                codes::UNAUTHORIZED,
                message.clone(),
                json!({}),
            ),
            Self::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                self.to_string(),
                json!({ "entity": entity, "id": id }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                codes::CONFLICT,
                message.clone(),
                json!({}),
            ),
            Self::Database(db_err) => match constraint_violation(db_err) {
                Some(message) => (
                    StatusCode::CONFLICT,
                    codes::CONFLICT,
                    message,
                    json!({ "cause": db_err.to_string() }),
                ),
                None => internal(self),
            },
            _ => internal(self),
        }
    }
}

fn internal(err: &Error) -> (StatusCode, &'static str, String, Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        codes::INTERNAL_ERROR,
        "Internal server error".to_string(),
        json!({ "cause": err.to_string() }),
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.to_parts();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), code, "Request rejected");
        }
        let body = json!({
            "error": {
                "code": code,
                "message": message,
                "details": details,
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::validation("bad"), StatusCode::BAD_REQUEST, codes::VALIDATION_FAILED),
            (
                Error::InvalidTransition {
                    from: "APPROVED".to_string(),
                    to: "PENDING".to_string(),
                },
                StatusCode::BAD_REQUEST,
                codes::INVALID_TRANSITION,
            ),
            (
                Error::Unauthorized {
                    message: "no".to_string(),
                },
                StatusCode::UNAUTHORIZED,
                codes::UNAUTHORIZED,
            ),
            (
                Error::not_found("college", "x"),
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
            ),
            (
                Error::Conflict {
                    message: "dup".to_string(),
                },
                StatusCode::CONFLICT,
                codes::CONFLICT,
            ),
            (
                Error::Database(DbErr::Custom("disk on fire".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL_ERROR,
            ),
        ];
        for (err, status, code) in cases {
            let (s, c, _, _) = err.to_parts();
            assert_eq!((s, c), (status, code), "{err}");
        }
    }

    #[test]
    fn test_internal_error_exposes_cause() {
        let err = Error::Database(DbErr::Custom("disk on fire".to_string()));
        let (_, _, message, details) = err.to_parts();
        assert_eq!(message, "Internal server error");
        assert!(details["cause"].as_str().unwrap_or_default().contains("disk on fire"));
    }
}
