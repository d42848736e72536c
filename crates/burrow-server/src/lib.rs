//! HTTP API server for the burrow sandboxed file browser.
//!
//! This crate is glue: it parses requests, enforces the session cookie,
//! calls into `burrow-core`, and translates results and typed errors
//! into JSON responses with stable error codes. All security-relevant
//! decisions (path confinement, token verification) happen in the core.
//!
//! By default the binary binds the server to localhost; TLS termination,
//! if wanted, belongs to a reverse proxy in front.

mod auth;
mod error;
mod files;
mod response;
mod router;
mod server;
mod state;

pub use error::ApiError;
pub use server::{ApiServer, ServerConfig};
pub use state::AppState;
