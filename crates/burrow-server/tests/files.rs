//! File API round trips against a running server.

mod common;

use common::{TestServer, TEST_UPLOAD_LIMIT};
use reqwest::StatusCode;

#[tokio::test]
async fn listing_root_orders_directories_first() {
    let ts = TestServer::start().await;
    ts.login().await;

    let entries: serde_json::Value = ts
        .client
        .get(ts.url("/api/files"))
        .send()
        .await
        .expect("send list")
        .json()
        .await
        .expect("parse list");
    let entries = entries.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "docs");
    assert_eq!(entries[0]["type"], "directory");
    assert_eq!(entries[1]["name"], "hello.txt");
    assert_eq!(entries[1]["type"], "file");
    assert_eq!(entries[1]["size"], 11);
}

#[tokio::test]
async fn info_reports_category_and_relative_path() {
    let ts = TestServer::start().await;
    ts.login().await;

    let info: serde_json::Value = ts
        .client
        .get(ts.url("/api/files/info?path=docs/notes.md"))
        .send()
        .await
        .expect("send info")
        .json()
        .await
        .expect("parse info");
    assert_eq!(info["name"], "notes.md");
    assert_eq!(info["path"], "docs/notes.md");
    assert_eq!(info["type"], "file");
    assert_eq!(info["category"], "markdown");
}

#[tokio::test]
async fn content_streams_the_file_with_a_content_type() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .get(ts.url("/api/files/content?path=hello.txt"))
        .send()
        .await
        .expect("send content");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(response.text().await.expect("read body"), "Hello World");
}

#[tokio::test]
async fn download_sets_attachment_disposition() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .get(ts.url("/api/files/download?path=hello.txt"))
        .send()
        .await
        .expect("send download");
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .expect("disposition header");
    assert_eq!(disposition, "attachment; filename=\"hello.txt\"");
}

#[tokio::test]
async fn traversal_attempts_are_forbidden() {
    let ts = TestServer::start().await;
    ts.login().await;

    for path in ["../secret", "..%2F..%2Fetc%2Fpasswd", "docs/../.."] {
        let response = ts
            .client
            .get(ts.url(&format!("/api/files/info?path={path}")))
            .send()
            .await
            .expect("send info");
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{path}");
        let body: serde_json::Value = response.json().await.expect("parse error");
        assert_eq!(body["code"], "PATH_FORBIDDEN");
    }
}

#[tokio::test]
async fn missing_paths_are_not_found() {
    let ts = TestServer::start().await;
    ts.login().await;

    // A path routed through an existing regular file is just as absent
    // as a missing one.
    for path in ["no-such-file.txt", "hello.txt/nested"] {
        let response = ts
            .client
            .get(ts.url(&format!("/api/files/info?path={path}")))
            .send()
            .await
            .expect("send info");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        let body: serde_json::Value = response.json().await.expect("parse error");
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn listing_a_file_is_a_bad_request() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .get(ts.url("/api/files?path=hello.txt"))
        .send()
        .await
        .expect("send list");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("parse error");
    assert_eq!(body["code"], "NOT_DIRECTORY");
}

#[tokio::test]
async fn upload_writes_the_file_and_returns_a_receipt() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .post(ts.url("/api/files/upload?path=docs&filename=upload.bin"))
        .body(vec![0x42u8; 1000])
        .send()
        .await
        .expect("send upload");
    assert_eq!(response.status(), StatusCode::OK);
    let receipt: serde_json::Value = response.json().await.expect("parse receipt");
    assert_eq!(receipt["name"], "upload.bin");
    assert_eq!(receipt["size"], 1000);

    let on_disk = std::fs::read(ts.root.path().join("docs/upload.bin")).expect("read upload");
    assert_eq!(on_disk, vec![0x42u8; 1000]);
}

#[tokio::test]
async fn upload_accepts_a_chunked_body_stream() {
    let ts = TestServer::start().await;
    ts.login().await;

    let chunks: Vec<Result<bytes::Bytes, std::io::Error>> = vec![
        Ok(bytes::Bytes::from_static(b"first ")),
        Ok(bytes::Bytes::from_static(b"second ")),
        Ok(bytes::Bytes::from_static(b"third")),
    ];
    let response = ts
        .client
        .post(ts.url("/api/files/upload?path=docs&filename=streamed.txt"))
        .body(reqwest::Body::wrap_stream(futures::stream::iter(chunks)))
        .send()
        .await
        .expect("send upload");
    assert_eq!(response.status(), StatusCode::OK);
    let receipt: serde_json::Value = response.json().await.expect("parse receipt");
    assert_eq!(receipt["name"], "streamed.txt");
    assert_eq!(receipt["size"], 18);
    assert_eq!(
        std::fs::read_to_string(ts.root.path().join("docs/streamed.txt")).expect("read upload"),
        "first second third"
    );
}

#[tokio::test]
async fn oversized_upload_is_refused_and_leaves_no_file() {
    let ts = TestServer::start().await;
    ts.login().await;

    let body = vec![0u8; usize::try_from(TEST_UPLOAD_LIMIT).expect("limit fits") + 1];
    let response = ts
        .client
        .post(ts.url("/api/files/upload?path=&filename=big.bin"))
        .body(body)
        .send()
        .await
        .expect("send upload");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let error: serde_json::Value = response.json().await.expect("parse error");
    assert_eq!(error["code"], "FILE_TOO_LARGE");
    assert!(!ts.root.path().join("big.bin").exists());
}

#[tokio::test]
async fn upload_filename_with_separators_is_reduced_to_its_basename() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .post(ts.url("/api/files/upload?path=&filename=..%2F..%2Fescape.txt"))
        .body("data")
        .send()
        .await
        .expect("send upload");
    assert_eq!(response.status(), StatusCode::OK);
    let receipt: serde_json::Value = response.json().await.expect("parse receipt");
    assert_eq!(receipt["name"], "escape.txt");
    // The file lands inside the sandbox, not above it.
    assert!(ts.root.path().join("escape.txt").exists());
    assert!(!ts.root.path().parent().expect("parent").join("escape.txt").exists());
}

#[tokio::test]
async fn upload_with_empty_filename_is_invalid() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .post(ts.url("/api/files/upload?path=&filename=.."))
        .body("data")
        .send()
        .await
        .expect("send upload");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: serde_json::Value = response.json().await.expect("parse error");
    assert_eq!(error["code"], "INVALID_FILENAME");
}

#[tokio::test]
async fn mkdir_then_upload_then_delete_round_trip() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .post(ts.url("/api/files/mkdir?path=projects/new"))
        .send()
        .await
        .expect("send mkdir");
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("parse mkdir");
    assert_eq!(body["path"], "projects/new");
    assert!(ts.root.path().join("projects/new").is_dir());

    let response = ts
        .client
        .post(ts.url("/api/files/upload?path=projects/new&filename=a.txt"))
        .body("contents")
        .send()
        .await
        .expect("send upload");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ts
        .client
        .delete(ts.url("/api/files?path=projects"))
        .send()
        .await
        .expect("send delete");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!ts.root.path().join("projects").exists());
}

#[tokio::test]
async fn rename_moves_a_file() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .put(ts.url("/api/files/rename"))
        .json(&serde_json::json!({
            "old_path": "hello.txt",
            "new_path": "docs/greeting.txt",
        }))
        .send()
        .await
        .expect("send rename");
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("parse rename");
    assert_eq!(body["path"], "docs/greeting.txt");
    assert!(!ts.root.path().join("hello.txt").exists());
    assert_eq!(
        std::fs::read_to_string(ts.root.path().join("docs/greeting.txt")).expect("read moved"),
        "Hello World"
    );
}

#[tokio::test]
async fn deleting_the_root_is_forbidden() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .delete(ts.url("/api/files?path="))
        .send()
        .await
        .expect("send delete");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(ts.root.path().join("hello.txt").exists());
}
