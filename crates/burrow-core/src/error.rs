//! Typed error set for sandboxed filesystem operations.

use std::io;

use thiserror::Error;

/// Errors raised by [`PathResolver`](crate::fs::PathResolver) and
/// [`FilesystemStore`](crate::fs::FilesystemStore).
///
/// Every variant is terminal for the single operation that raised it;
/// nothing is retried internally. The API layer maps each variant to a
/// distinct, stable external status so clients can tell "bad path" from
/// "not found" from "too big".
#[derive(Error, Debug)]
pub enum FsError {
    /// The requested path resolves outside the sandbox root.
    ///
    /// Always a client-input problem, raised before any I/O primitive
    /// sees the offending path.
    #[error("path escapes the sandbox root: {path}")]
    PathEscape { path: String },

    /// No file or directory at the resolved path.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// The operation needs a directory but the path is a file (or is
    /// absent where a directory was required).
    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    /// The operation needs a regular file but the path is a directory.
    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    /// An upload filename reduced to nothing after stripping path
    /// components.
    #[error("invalid filename: {name:?}")]
    InvalidFilename { name: String },

    /// An upload exceeded the configured byte cap. The partial file has
    /// already been removed.
    #[error("upload exceeds the size limit of {limit} bytes")]
    TooLarge { limit: u64 },

    /// The filesystem ran out of space mid-write. The partial file has
    /// already been removed.
    #[error("storage exhausted while writing {path}")]
    StorageExhausted { path: String },

    /// Structurally forbidden operation, e.g. deleting the root itself.
    #[error("operation not permitted: {reason}")]
    PermissionDenied { reason: String },

    /// Any other I/O failure, passed through unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias used throughout the filesystem layer.
pub type FsResult<T> = Result<T, FsError>;
