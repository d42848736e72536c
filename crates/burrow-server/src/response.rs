//! Response construction helpers.

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Body type shared by every response: fixed JSON payloads and streamed
/// file content both box into this.
pub type ApiBody = UnsyncBoxBody<Bytes, std::io::Error>;

pub fn full_body(bytes: impl Into<Bytes>) -> ApiBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Serialize `value` as a JSON response with the given status.
pub fn json(status: StatusCode, value: &impl Serialize) -> Response<ApiBody> {
    let bytes = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(full_body(bytes));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// JSON error envelope: `{"error": message, "code": code}`.
pub fn error(status: StatusCode, code: &str, message: &str) -> Response<ApiBody> {
    json(
        status,
        &serde_json::json!({ "error": message, "code": code }),
    )
}
