//! Mapping from core errors to stable API statuses and codes.

use burrow_core::FsError;
use hyper::StatusCode;
use thiserror::Error;
use tracing::error;

use crate::response::{self, ApiBody};

/// Request-level failures, each carrying a distinct external status and
/// machine-readable code so clients can tell "bad path" from "not
/// found" from "too big".
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid, or expired session cookie.
    #[error("not authenticated")]
    Unauthorized,

    /// Login credentials rejected by the identity backend.
    #[error("invalid credentials")]
    AuthFailed,

    /// Malformed request (bad JSON body, missing parameter).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The client went away mid-upload; the partial file was removed.
    #[error("upload aborted by client")]
    UploadAborted,

    /// Typed filesystem failure from the core.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Anything unexpected (task join failure, I/O on the response).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::AuthFailed => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) | ApiError::UploadAborted => StatusCode::BAD_REQUEST,
            ApiError::Fs(e) => match e {
                FsError::PathEscape { .. } | FsError::PermissionDenied { .. } => {
                    StatusCode::FORBIDDEN
                }
                FsError::NotFound { .. } => StatusCode::NOT_FOUND,
                FsError::NotADirectory { .. }
                | FsError::IsADirectory { .. }
                | FsError::InvalidFilename { .. } => StatusCode::BAD_REQUEST,
                FsError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                FsError::StorageExhausted { .. } => StatusCode::INSUFFICIENT_STORAGE,
                FsError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::AuthFailed => "AUTH_FAILED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::UploadAborted => "UPLOAD_ABORTED",
            ApiError::Fs(e) => match e {
                FsError::PathEscape { .. } | FsError::PermissionDenied { .. } => "PATH_FORBIDDEN",
                FsError::NotFound { .. } => "NOT_FOUND",
                FsError::NotADirectory { .. } => "NOT_DIRECTORY",
                FsError::IsADirectory { .. } => "IS_DIRECTORY",
                FsError::InvalidFilename { .. } => "INVALID_FILENAME",
                FsError::TooLarge { .. } => "FILE_TOO_LARGE",
                FsError::StorageExhausted { .. } => "INSUFFICIENT_STORAGE",
                FsError::Io(_) => "INTERNAL_ERROR",
            },
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Short client-facing message. Internal details stay in the logs.
    fn message(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "Not authenticated",
            ApiError::AuthFailed => "Invalid credentials",
            ApiError::BadRequest(_) => "Bad request",
            ApiError::UploadAborted => "Upload aborted",
            ApiError::Fs(e) => match e {
                FsError::PathEscape { .. } | FsError::PermissionDenied { .. } => "Access denied",
                FsError::NotFound { .. } => "Not found",
                FsError::NotADirectory { .. } => "Not a directory",
                FsError::IsADirectory { .. } => "Is a directory",
                FsError::InvalidFilename { .. } => "Invalid filename",
                FsError::TooLarge { .. } => "File too large",
                FsError::StorageExhausted { .. } => "Insufficient storage",
                FsError::Io(_) => "Internal server error",
            },
            ApiError::Internal(_) => "Internal server error",
        }
    }

    pub fn into_response(self) -> hyper::Response<ApiBody> {
        if self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
        }
        response::error(self.status(), self.code(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_errors_map_to_distinct_codes() {
        let cases: [(FsError, StatusCode, &str); 5] = [
            (
                FsError::PathEscape {
                    path: "../etc".into(),
                },
                StatusCode::FORBIDDEN,
                "PATH_FORBIDDEN",
            ),
            (
                FsError::NotFound { path: "x".into() },
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                FsError::NotADirectory { path: "x".into() },
                StatusCode::BAD_REQUEST,
                "NOT_DIRECTORY",
            ),
            (
                FsError::TooLarge { limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
                "FILE_TOO_LARGE",
            ),
            (
                FsError::StorageExhausted { path: "x".into() },
                StatusCode::INSUFFICIENT_STORAGE,
                "INSUFFICIENT_STORAGE",
            ),
        ];
        for (fs_error, status, code) in cases {
            let api_error = ApiError::from(fs_error);
            assert_eq!(api_error.status(), status);
            assert_eq!(api_error.code(), code);
        }
    }

    #[test]
    fn session_failures_are_unauthorized() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::AuthFailed.status(), StatusCode::UNAUTHORIZED);
        assert_ne!(ApiError::Unauthorized.code(), ApiError::AuthFailed.code());
    }
}
