//! Request dispatch.

use std::sync::Arc;

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use tracing::debug;

use crate::error::ApiError;
use crate::response::{self, ApiBody};
use crate::state::AppState;
use crate::{auth, files};

/// Route a request to its handler and flatten errors into responses.
pub async fn handle(state: Arc<AppState>, req: Request<Incoming>) -> Response<ApiBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!(%method, %path, "request");

    let result = match (&method, path.as_str()) {
        (&Method::POST, "/api/auth/login") => auth::login(state, req).await,
        (&Method::POST, "/api/auth/logout") => auth::logout(&state),
        (&Method::GET, "/api/auth/me") => auth::me(&state, &req),
        (&Method::GET, "/api/files") => files::list(state, req).await,
        (&Method::GET, "/api/files/info") => files::info(state, req).await,
        (&Method::GET, "/api/files/content") => files::content(state, req, false).await,
        (&Method::GET, "/api/files/download") => files::content(state, req, true).await,
        (&Method::POST, "/api/files/upload") => files::upload(state, req).await,
        (&Method::POST, "/api/files/mkdir") => files::mkdir(state, req).await,
        (&Method::PUT, "/api/files/rename") => files::rename(state, req).await,
        (&Method::DELETE, "/api/files") => files::delete(state, req).await,
        _ => Ok(response::error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "No such route",
        )),
    };
    result.unwrap_or_else(ApiError::into_response)
}

/// Extract a query-string parameter.
pub fn query_param(req: &Request<Incoming>, name: &str) -> Option<String> {
    let query = req.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// The `path` parameter, defaulting to the root.
pub fn path_param(req: &Request<Incoming>) -> String {
    query_param(req, "path").unwrap_or_default()
}

/// Run a synchronous store operation off the async executor.
pub async fn run_blocking<T, F>(operation: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, burrow_core::FsError> + Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}
