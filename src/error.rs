//! Maps domain errors to HTTP responses.
//!
//! Every error leaves the server as `{success: false, error, details?}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::protocol::{ErrorEnvelope, StorageError};
use crate::relay::RelayError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed request input (400)
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    /// Non-2xx from an upstream API; the status is passed through
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<Value>,
    },
    /// Anything unexpected (500). `details` is only filled in dev mode.
    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>, cause: &dyn std::fmt::Display, dev_mode: bool) -> Self {
        let message = message.into();
        tracing::error!(cause = %cause, "{}", message);
        AppError::Internal {
            message,
            details: dev_mode.then(|| cause.to_string()),
        }
    }

    /// Storage failure on a route whose generic failure text is `failure`
    pub fn from_storage(err: StorageError, failure: &str, dev_mode: bool) -> Self {
        match err {
            StorageError::PathTraversal { .. }
            | StorageError::InvalidPath { .. }
            | StorageError::PermissionDenied { .. }
            | StorageError::NotADirectory { .. }
            | StorageError::NotAFile { .. }
            | StorageError::FileTooLarge { .. } => AppError::Validation(err.to_string()),
            StorageError::AlreadyExists { .. } => AppError::Conflict(err.to_string()),
            StorageError::NotFound { .. } => AppError::NotFound(err.to_string()),
            StorageError::Io { .. } => AppError::internal(failure, &err, dev_mode),
        }
    }

    pub fn from_relay(err: RelayError, failure: &str, dev_mode: bool) -> Self {
        match err {
            RelayError::InvalidRepoUrl => AppError::Validation(err.to_string()),
            RelayError::Upstream {
                status,
                message,
                details,
            } => AppError::Upstream {
                status,
                message,
                details,
            },
            RelayError::Transport(_) | RelayError::Decode(_) => {
                AppError::internal(failure, &err, dev_mode)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Upstream {
                message, details, ..
            } => ErrorEnvelope {
                success: false,
                error: message,
                details,
            },
            AppError::Internal { message, details } => ErrorEnvelope {
                success: false,
                error: message,
                details: details.map(Value::String),
            },
            other => ErrorEnvelope {
                success: false,
                error: other.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_client_statuses() {
        let traversal = StorageError::PathTraversal {
            attempted_path: "../x".to_string(),
        };
        assert_eq!(
            AppError::from_storage(traversal, "Failed", false).status(),
            StatusCode::BAD_REQUEST
        );
        let exists = StorageError::AlreadyExists {
            path: "a.md".to_string(),
        };
        assert_eq!(AppError::from_storage(exists, "Failed", false).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_details_only_in_dev_mode() {
        let io = || StorageError::Io {
            message: "disk on fire".to_string(),
        };
        match AppError::from_storage(io(), "Failed to save file", false) {
            AppError::Internal { message, details } => {
                assert_eq!(message, "Failed to save file");
                assert!(details.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        match AppError::from_storage(io(), "Failed to save file", true) {
            AppError::Internal { details, .. } => {
                assert_eq!(details.as_deref(), Some("io error: disk on fire"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn upstream_status_passes_through() {
        let err = AppError::from_relay(
            RelayError::Upstream {
                status: 401,
                message: "GitLab API error: 401".to_string(),
                details: None,
            },
            "Failed",
            false,
        );
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "GitLab API error: 401");
    }
}
