//! Shared harness for API integration tests: a real server over a
//! seeded temporary directory, driven through reqwest.

use std::sync::Arc;
use std::time::Duration;

use burrow_core::auth::FixedVerifier;
use burrow_core::Settings;
use burrow_server::{ApiServer, AppState, ServerConfig};
use secrecy::SecretString;
use tempfile::TempDir;

pub const TEST_USER: &str = "alice";
pub const TEST_PASSWORD: &str = "wonderland";

/// Upload cap used by the harness; small enough that tests can trip it
/// with an in-memory body.
pub const TEST_UPLOAD_LIMIT: u64 = 16 * 1024;

pub struct TestServer {
    pub server: ApiServer,
    pub client: reqwest::Client,
    // Held so the sandbox outlives the server.
    pub root: TempDir,
}

impl TestServer {
    /// Start a server on an auto-assigned port over a fresh sandbox:
    ///
    /// ```text
    /// hello.txt          "Hello World"
    /// docs/notes.md      "# Notes\n"
    /// docs/report.pdf    (empty)
    /// ```
    pub async fn start() -> Self {
        let root = TempDir::new().expect("create sandbox");
        std::fs::write(root.path().join("hello.txt"), "Hello World").expect("seed hello.txt");
        std::fs::create_dir(root.path().join("docs")).expect("seed docs/");
        std::fs::write(root.path().join("docs/notes.md"), "# Notes\n").expect("seed notes.md");
        std::fs::write(root.path().join("docs/report.pdf"), "").expect("seed report.pdf");

        let settings = Settings {
            root_dir: root.path().to_path_buf(),
            session_max_age: Duration::from_secs(3600),
            upload_limit: TEST_UPLOAD_LIMIT,
            secret_key: SecretString::from("integration-test-secret"),
            secure_cookies: false,
        };
        let verifier = Arc::new(FixedVerifier::new(TEST_USER, TEST_PASSWORD));
        let state = AppState::new(&settings, verifier).expect("build state");
        let server = ApiServer::start(state, ServerConfig::default())
            .await
            .expect("start server");

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("build client");

        Self {
            server,
            client,
            root,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server.url())
    }

    /// Authenticate as the fixture user; the client keeps the cookie.
    pub async fn login(&self) {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({
                "username": TEST_USER,
                "password": TEST_PASSWORD,
            }))
            .send()
            .await
            .expect("send login");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }
}
