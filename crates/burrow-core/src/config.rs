//! Process-wide configuration for the service core.
//!
//! Settings are plain data handed explicitly to constructors; nothing in
//! the core reads ambient globals, so tests can build settings with
//! arbitrary temporary roots and secrets.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use rand::RngCore;
use secrecy::SecretString;

/// Default session lifetime: 30 days.
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Default upload cap: 1 GiB.
pub const DEFAULT_UPLOAD_LIMIT: u64 = 1024 * 1024 * 1024;

/// Everything the core components consume.
pub struct Settings {
    /// Sandbox root; all operations are confined beneath it.
    pub root_dir: PathBuf,
    /// Maximum accepted session token age.
    pub session_max_age: Duration,
    /// Upload size cap in bytes.
    pub upload_limit: u64,
    /// HMAC secret for session tokens. Must stay stable across restarts
    /// for existing sessions to survive.
    pub secret_key: SecretString,
    /// Mark the session cookie `Secure` (requires TLS in front).
    pub secure_cookies: bool,
}

impl Settings {
    /// Defaults rooted at the current user's home directory, with
    /// overrides from `BURROW_SECRET_KEY` and `BURROW_SECURE_COOKIES`.
    ///
    /// When no secret is configured a random one is generated; sessions
    /// signed with a generated secret do not survive a restart.
    pub fn from_env() -> Self {
        let root_dir = directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let secret_key = match env::var("BURROW_SECRET_KEY") {
            Ok(secret) if !secret.is_empty() => SecretString::from(secret),
            _ => generate_secret(),
        };
        let secure_cookies = env::var("BURROW_SECURE_COOKIES")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            root_dir,
            session_max_age: DEFAULT_SESSION_MAX_AGE,
            upload_limit: DEFAULT_UPLOAD_LIMIT,
            secret_key,
            secure_cookies,
        }
    }
}

/// Random 32-byte hex signing secret.
pub fn generate_secret() -> SecretString {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    SecretString::from(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn generated_secrets_are_long_and_unique() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.expose_secret().len(), 64);
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn defaults_are_sane() {
        assert_eq!(DEFAULT_SESSION_MAX_AGE.as_secs(), 2_592_000);
        assert_eq!(DEFAULT_UPLOAD_LIMIT, 1_073_741_824);
    }
}
