//! File and directory endpoints.

use std::path::Path;
use std::sync::Arc;

use burrow_core::FsError;
use bytes::Bytes;
use futures::stream;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::header::{self, HeaderValue};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::warn;

use crate::auth::require_session;
use crate::error::ApiError;
use crate::response::{self, ApiBody};
use crate::router::{path_param, query_param, run_blocking};
use crate::state::AppState;

/// Read chunk size for streamed downloads.
const DOWNLOAD_CHUNK: usize = 64 * 1024;

/// `GET /api/files?path=` -- directory listing.
pub async fn list(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<ApiBody>, ApiError> {
    require_session(&state, &req)?;
    let path = path_param(&req);
    let store = state.store.clone();
    let entries = run_blocking(move || store.list(&path)).await?;
    Ok(response::json(StatusCode::OK, &entries))
}

/// `GET /api/files/info?path=` -- metadata and category for one entry.
pub async fn info(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<ApiBody>, ApiError> {
    require_session(&state, &req)?;
    let path = path_param(&req);
    let store = state.store.clone();
    let info = run_blocking(move || store.info(&path)).await?;
    Ok(response::json(StatusCode::OK, &info))
}

/// `GET /api/files/content?path=` and `GET /api/files/download?path=` --
/// stream a file body; download additionally asks the browser to save.
pub async fn content(
    state: Arc<AppState>,
    req: Request<Incoming>,
    attachment: bool,
) -> Result<Response<ApiBody>, ApiError> {
    require_session(&state, &req)?;
    let path = path_param(&req);
    let store = state.store.clone();
    let resolved = run_blocking(move || store.file_path(&path)).await?;
    stream_file(&resolved, attachment).await
}

/// `POST /api/files/upload?path=&filename=` -- stream the raw request
/// body into a new file under the target directory.
pub async fn upload(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<ApiBody>, ApiError> {
    require_session(&state, &req)?;
    let dir = path_param(&req);
    let filename = query_param(&req, "filename")
        .ok_or_else(|| ApiError::BadRequest("missing filename parameter".to_string()))?;
    let limit = state.upload_limit;
    let store = state.store.clone();
    let mut sink = run_blocking(move || store.begin_upload(&dir, &filename, limit)).await?;

    let mut body = req.into_body();
    loop {
        match body.frame().await {
            None => break,
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    // Chunk writes hit the disk; keep them off the
                    // executor like every other store call.
                    sink = run_blocking(move || {
                        sink.write_chunk(&data)?;
                        Ok(sink)
                    })
                    .await?;
                }
            }
            Some(Err(e)) => {
                // Client went away mid-stream; aborting the sink removes
                // the partial file.
                warn!(error = %e, "upload body interrupted");
                run_blocking(move || {
                    sink.abort();
                    Ok(())
                })
                .await?;
                return Err(ApiError::UploadAborted);
            }
        }
    }
    let receipt = run_blocking(move || sink.finish()).await?;
    Ok(response::json(StatusCode::OK, &receipt))
}

/// `POST /api/files/mkdir?path=` -- idempotent directory creation.
pub async fn mkdir(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<ApiBody>, ApiError> {
    require_session(&state, &req)?;
    let path = path_param(&req);
    let store = state.store.clone();
    let relative = run_blocking(move || {
        let created = store.mkdir(&path)?;
        Ok(store.relativize(&created))
    })
    .await?;
    Ok(response::json(
        StatusCode::OK,
        &serde_json::json!({ "path": relative }),
    ))
}

#[derive(Deserialize)]
struct RenameRequest {
    old_path: String,
    new_path: String,
}

/// `PUT /api/files/rename` -- move or rename a file or directory.
pub async fn rename(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<ApiBody>, ApiError> {
    require_session(&state, &req)?;
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
        .to_bytes();
    let request: RenameRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("malformed rename request: {e}")))?;
    let store = state.store.clone();
    let relative = run_blocking(move || {
        let moved = store.rename(&request.old_path, &request.new_path)?;
        Ok(store.relativize(&moved))
    })
    .await?;
    Ok(response::json(
        StatusCode::OK,
        &serde_json::json!({ "path": relative }),
    ))
}

/// `DELETE /api/files?path=` -- remove a file or directory tree.
pub async fn delete(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<ApiBody>, ApiError> {
    require_session(&state, &req)?;
    let path = path_param(&req);
    let store = state.store.clone();
    run_blocking(move || store.delete(&path)).await?;
    Ok(response::json(
        StatusCode::OK,
        &serde_json::json!({ "ok": true }),
    ))
}

/// Build a streaming response for a file already validated by the store.
async fn stream_file(resolved: &Path, attachment: bool) -> Result<Response<ApiBody>, ApiError> {
    let name = resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = match tokio::fs::File::open(resolved).await {
        Ok(file) => file,
        // The file can vanish between validation and open.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::Fs(FsError::NotFound { path: name }));
        }
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    let body_stream = stream::unfold(file, |mut file| async move {
        let mut buf = vec![0u8; DOWNLOAD_CHUNK];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(Frame::data(Bytes::from(buf))), file))
            }
            Err(e) => Some((Err(e), file)),
        }
    });
    let mut response = Response::new(StreamBody::new(body_stream).boxed_unsync());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&name)),
    );
    if attachment {
        let disposition = format!("attachment; filename=\"{}\"", name.replace('"', "_"));
        response.headers_mut().insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition)
                .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
        );
    }
    Ok(response)
}

/// Best-effort content type for browser previews.
fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("txt" | "log" | "csv" | "toml" | "conf") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("json") => "application/json",
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}
