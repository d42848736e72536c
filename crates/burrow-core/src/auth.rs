//! Identity verification against the host account system.
//!
//! The contract is a single boolean call so alternate identity backends
//! (a directory service, fixed dev credentials) can be substituted
//! without touching session logic. No retry, caching, or rate limiting
//! lives here; rate limiting, if wanted, belongs to the API layer.

#[cfg(feature = "pam")]
use tracing::warn;

/// Capability interface for credential checks.
pub trait IdentityVerifier: Send + Sync {
    /// Check a username/password pair. `false` covers both bad
    /// credentials and backend failure.
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Delegates verification to the host's PAM stack.
#[cfg(feature = "pam")]
pub struct PamVerifier {
    service: String,
}

#[cfg(feature = "pam")]
impl PamVerifier {
    /// `service` names the PAM service configuration to authenticate
    /// against (usually `login`).
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

#[cfg(feature = "pam")]
impl IdentityVerifier for PamVerifier {
    fn verify(&self, username: &str, password: &str) -> bool {
        let mut authenticator = match pam::Authenticator::with_password(&self.service) {
            Ok(authenticator) => authenticator,
            Err(e) => {
                warn!(error = ?e, service = %self.service, "PAM initialization failed");
                return false;
            }
        };
        authenticator.get_handler().set_credentials(username, password);
        authenticator.authenticate().is_ok()
    }
}

/// Fixed single-user credentials, for tests and deployments built
/// without PAM support.
pub struct FixedVerifier {
    username: String,
    password: String,
}

impl FixedVerifier {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl IdentityVerifier for FixedVerifier {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}
