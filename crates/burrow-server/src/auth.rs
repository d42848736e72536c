//! Login, logout, and session-cookie enforcement.

use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use tokio::task;
use tracing::info;

use crate::error::ApiError;
use crate::response::{self, ApiBody};
use crate::state::AppState;

/// Name of the session cookie.
const SESSION_COOKIE: &str = "session";

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

/// `POST /api/auth/login` -- verify credentials against the identity
/// backend and issue a session cookie.
pub async fn login(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<ApiBody>, ApiError> {
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
        .to_bytes();
    let credentials: LoginRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("malformed login request: {e}")))?;

    let username = credentials.username.clone();
    let verifier = Arc::clone(&state.verifier);
    // Host credential checks (PAM) can block on the OS.
    let accepted = task::spawn_blocking(move || {
        verifier.verify(&credentials.username, &credentials.password)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    if !accepted {
        info!(%username, "login rejected");
        return Err(ApiError::AuthFailed);
    }

    let token = state.sessions.create(&username);
    info!(%username, "login accepted");
    let mut response = response::json(StatusCode::OK, &serde_json::json!({ "username": username }));
    response
        .headers_mut()
        .insert(header::SET_COOKIE, session_cookie(&state, &token));
    Ok(response)
}

/// `POST /api/auth/logout` -- expire the cookie client-side. The token
/// itself stays valid until it ages out; there is no server-side
/// session store to revoke it from.
pub fn logout(state: &AppState) -> Result<Response<ApiBody>, ApiError> {
    let mut response = response::json(StatusCode::OK, &serde_json::json!({ "ok": true }));
    response
        .headers_mut()
        .insert(header::SET_COOKIE, expired_cookie(state));
    Ok(response)
}

/// `GET /api/auth/me` -- identity behind the current session.
pub fn me(state: &AppState, req: &Request<Incoming>) -> Result<Response<ApiBody>, ApiError> {
    let username = require_session(state, req)?;
    Ok(response::json(
        StatusCode::OK,
        &serde_json::json!({ "username": username }),
    ))
}

/// Validate the session cookie, returning the identity it carries.
pub fn require_session(state: &AppState, req: &Request<Incoming>) -> Result<String, ApiError> {
    cookie_value(req.headers(), SESSION_COOKIE)
        .and_then(|token| state.sessions.validate(&token, state.session_max_age))
        .ok_or(ApiError::Unauthorized)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(header::COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for pair in raw.split(';') {
            if let Some((key, value)) = pair.trim().split_once('=') {
                if key == name {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

fn session_cookie(state: &AppState, token: &str) -> HeaderValue {
    let mut cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict");
    if state.secure_cookies {
        cookie.push_str("; Secure");
    }
    // Tokens are dot-separated base64; building the header cannot fail
    // for them, but fall back to clearing the cookie rather than panic.
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| expired_cookie(state))
}

fn expired_cookie(state: &AppState) -> HeaderValue {
    if state.secure_cookies {
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
    }
}
