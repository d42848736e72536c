//! Shared per-process state handed to every request handler.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use burrow_core::auth::IdentityVerifier;
use burrow_core::{FilesystemStore, SessionCodec, Settings};

/// Read-only state shared by all connections.
///
/// Everything here is set once at startup: the store's root and the
/// codec's key never change for the process lifetime, so no locking is
/// needed anywhere in the request path.
pub struct AppState {
    pub store: FilesystemStore,
    pub sessions: SessionCodec,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub session_max_age: Duration,
    pub upload_limit: u64,
    pub secure_cookies: bool,
}

impl AppState {
    /// Build the state from settings and a credential backend. Fails if
    /// the configured root directory does not exist.
    pub fn new(settings: &Settings, verifier: Arc<dyn IdentityVerifier>) -> io::Result<Self> {
        Ok(Self {
            store: FilesystemStore::new(&settings.root_dir)?,
            sessions: SessionCodec::new(&settings.secret_key),
            verifier,
            session_max_age: settings.session_max_age,
            upload_limit: settings.upload_limit,
            secure_cookies: settings.secure_cookies,
        })
    }
}
