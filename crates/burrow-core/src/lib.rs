//! Sandboxed home-directory filesystem core.
//!
//! This crate implements the security-critical pieces of the file
//! browser service:
//!
//! - symlink-aware path confinement beneath a fixed root directory
//!   ([`fs::PathResolver`]),
//! - the filesystem operations routed through it
//!   ([`fs::FilesystemStore`]),
//! - stateless HMAC-signed session tokens ([`session::SessionCodec`]),
//! - the host-credential verification seam ([`auth::IdentityVerifier`]).
//!
//! The HTTP surface lives in `burrow-server`; nothing in this crate
//! knows about HTTP. All configuration is injected explicitly through
//! [`config::Settings`] so tests can run against arbitrary temporary
//! roots and secrets.

pub mod auth;
pub mod config;
pub mod error;
pub mod fs;
pub mod session;

pub use config::Settings;
pub use error::FsError;
pub use fs::{
    DirEntry, EntryInfo, EntryKind, FileCategory, FilesystemStore, PathResolver, UploadReceipt,
    UploadSink,
};
pub use session::SessionCodec;
