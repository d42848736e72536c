//! Stateless signed session tokens.
//!
//! A token binds an identity string to an issuance time:
//!
//! ```text
//! identity "." base64url(issued_at_secs) "." base64url(hmac_sha256(secret, payload))
//! ```
//!
//! where `payload` is everything before the final dot. The identity
//! travels in the clear: the token is tamper-evident, not confidential.
//! Fields are split from the right so the identity itself may contain
//! dots.
//!
//! There is no server-side session registry and no revocation: logout is
//! a client-side cookie deletion, and an issued token stays technically
//! valid until it ages out. That is a documented limitation of the
//! stateless scheme, accepted in exchange for holding no session store.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ring::hmac;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::debug;

/// Signs and verifies session tokens with a process-wide secret.
///
/// The secret must stay stable across restarts for existing sessions to
/// remain valid; it is loaded once at startup and never rotated at
/// runtime.
#[derive(Clone)]
pub struct SessionCodec {
    key: hmac::Key,
}

impl SessionCodec {
    /// Build a codec from the configured signing secret.
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.expose_secret().as_bytes()),
        }
    }

    /// Issue a token for `identity`, stamped with the current time.
    pub fn create(&self, identity: &str) -> String {
        self.create_at(identity, unix_now())
    }

    fn create_at(&self, identity: &str, issued_at: u64) -> String {
        let payload = format!(
            "{identity}.{}",
            URL_SAFE_NO_PAD.encode(issued_at.to_be_bytes())
        );
        let tag = hmac::sign(&self.key, payload.as_bytes());
        format!("{payload}.{}", URL_SAFE_NO_PAD.encode(tag.as_ref()))
    }

    /// Verify a token and return its identity.
    ///
    /// `None` covers every routine failure -- bad signature, malformed
    /// fields, empty input, age beyond `max_age`. An invalid or expired
    /// session is an expected outcome, not an error.
    pub fn validate(&self, token: &str, max_age: Duration) -> Option<String> {
        self.validate_at(token, max_age, unix_now())
    }

    fn validate_at(&self, token: &str, max_age: Duration, now: u64) -> Option<String> {
        let (payload, tag_b64) = token.rsplit_once('.')?;
        let tag = URL_SAFE_NO_PAD.decode(tag_b64).ok()?;
        let expected = hmac::sign(&self.key, payload.as_bytes());
        if !bool::from(expected.as_ref().ct_eq(tag.as_slice())) {
            debug!("session token signature mismatch");
            return None;
        }
        let (identity, stamp_b64) = payload.rsplit_once('.')?;
        if identity.is_empty() {
            return None;
        }
        let stamp: [u8; 8] = URL_SAFE_NO_PAD.decode(stamp_b64).ok()?.try_into().ok()?;
        let issued_at = u64::from_be_bytes(stamp);
        // A future-dated stamp counts as age zero rather than invalid.
        let age = now.saturating_sub(issued_at);
        if age > max_age.as_secs() {
            debug!(age, "session token expired");
            return None;
        }
        Some(identity.to_string())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
