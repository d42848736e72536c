//! Authentication flow against a running server.

mod common;

use common::TestServer;
use reqwest::StatusCode;

#[tokio::test]
async fn login_issues_session_cookie_and_me_reflects_it() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .get(ts.url("/api/auth/me"))
        .send()
        .await
        .expect("send me");
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("parse me");
    assert_eq!(body["username"], common::TEST_USER);
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let ts = TestServer::start().await;
    let response = ts
        .client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "username": common::TEST_USER,
            "password": "not-the-password",
        }))
        .send()
        .await
        .expect("send login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.expect("parse error");
    assert_eq!(body["code"], "AUTH_FAILED");
}

#[tokio::test]
async fn malformed_login_body_is_a_bad_request() {
    let ts = TestServer::start().await;
    let response = ts
        .client
        .post(ts.url("/api/auth/login"))
        .body("not json")
        .send()
        .await
        .expect("send login");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn file_routes_require_a_session() {
    let ts = TestServer::start().await;
    for url in [
        ts.url("/api/files"),
        ts.url("/api/files/info?path=hello.txt"),
        ts.url("/api/files/content?path=hello.txt"),
        ts.url("/api/auth/me"),
    ] {
        let response = ts.client.get(&url).send().await.expect("send");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{url}");
        let body: serde_json::Value = response.json().await.expect("parse error");
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let ts = TestServer::start().await;
    ts.login().await;

    let response = ts
        .client
        .post(ts.url("/api/auth/logout"))
        .send()
        .await
        .expect("send logout");
    assert_eq!(response.status(), StatusCode::OK);

    // The cookie store honored Max-Age=0, so the session is gone.
    let response = ts
        .client
        .get(ts.url("/api/auth/me"))
        .send()
        .await
        .expect("send me");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forged_cookie_is_rejected() {
    let ts = TestServer::start().await;
    let response = ts
        .client
        .get(ts.url("/api/auth/me"))
        .header("Cookie", "session=alice.AAAAAAAAAAA.forgedforgedforged")
        .send()
        .await
        .expect("send me");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let ts = TestServer::start().await;
    let response = ts
        .client
        .get(ts.url("/api/nope"))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
