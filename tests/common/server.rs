//! Test server management.
//!
//! Runs a macrogate instance in-process on an ephemeral port, next to a stub
//! captcha endpoint that accepts the token `"pass"` and nothing else.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::post;
use axum::{Form, Json, Router};
use macrogate::artifacts::{FsArtifactStore, seed_placeholders};
use macrogate::gate::UserRecord;
use macrogate::gate::identity::encode_session;
use macrogate::security::{HttpChallengeVerifier, Signer};
use macrogate::storage::Storage;
use macrogate::{AppState, Config, Database};
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Token the stub captcha endpoint accepts.
pub const GOOD_TOKEN: &str = "pass";

pub const COOKIE_SECRET: &str = "integration-Zq8rVt2LmN4pXw6yHb1cKd3fGj5sTu7e";

/// Identity on the static allow-list.
pub const ADMIN_ID: &str = "admin-1";

/// Identity banned at startup.
pub const SEEDED_BANNED_ID: &str = "seeded-bad";

pub const ARTIFACTS: [&str; 2] = ["better-tiny-task", "grow-garden"];

/// A test server instance.
pub struct TestServer {
    addr: SocketAddr,
    signer: Signer,
    artifacts_dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    challenge_shutdown: Option<oneshot::Sender<()>>,
}

async fn siteverify(Form(form): Form<HashMap<String, String>>) -> Json<serde_json::Value> {
    let ok = form.get("response").map(String::as_str) == Some(GOOD_TOKEN)
        && form.get("secret").map(String::as_str) == Some("challenge-secret");
    if ok {
        Json(json!({ "success": true }))
    } else {
        Json(json!({ "success": false, "error-codes": ["invalid-input-response"] }))
    }
}

impl TestServer {
    /// Spawn a new test server.
    pub async fn spawn() -> anyhow::Result<Self> {
        let artifacts_dir = tempfile::tempdir()?;

        // Stub captcha provider
        let challenge_listener = TcpListener::bind("127.0.0.1:0").await?;
        let challenge_addr = challenge_listener.local_addr()?;
        let (challenge_tx, challenge_rx) = oneshot::channel::<()>();
        let challenge_app = Router::new().route("/siteverify", post(siteverify));
        tokio::spawn(async move {
            let _ = axum::serve(challenge_listener, challenge_app)
                .with_graceful_shutdown(async {
                    let _ = challenge_rx.await;
                })
                .await;
        });

        let config_content = format!(
            r#"
[server]
listen = "127.0.0.1:0"
metrics_port = 0

[database]
path = ":memory:"

[artifacts]
dir = '{}'
ids = ["better-tiny-task", "grow-garden"]

[security]
cookie_secret = "{COOKIE_SECRET}"
secure_cookies = false

[access]
allow_list = ["{ADMIN_ID}"]
privileged_roles = ["staff"]
seed_banned_identities = ["{SEEDED_BANNED_ID}"]

[challenge]
verify_url = "http://{challenge_addr}/siteverify"
secret = "challenge-secret"
timeout_secs = 2
"#,
            artifacts_dir.path().display()
        );
        let config = Config::parse(&config_content)?;

        let db = Database::new(&config.database.path).await?;
        db.seed_counters(&config.artifacts.ids).await?;
        seed_placeholders(&config.artifacts.dir_path(), &config.artifacts.ids).await?;

        let verifier = Arc::new(HttpChallengeVerifier::new(&config.challenge));
        let artifacts = Arc::new(FsArtifactStore::new(config.artifacts.dir_path()));
        let state = Arc::new(AppState::new(config, Arc::new(db), verifier, artifacts));
        state
            .registry
            .seed(&state.config.access.seed_banned_identities)
            .await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = macrogate::http::serve(listener, state, async {
                let _ = rx.await;
            })
            .await;
        });

        Ok(Self {
            addr,
            signer: Signer::new(COOKIE_SECRET),
            artifacts_dir,
            shutdown: Some(tx),
            challenge_shutdown: Some(challenge_tx),
        })
    }

    /// Base URL of the server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Directory the server serves artifacts from.
    pub fn artifacts_dir(&self) -> &std::path::Path {
        self.artifacts_dir.path()
    }

    /// Session cookie value for a user, as the login flow would issue it.
    pub fn session_for(&self, id: &str, roles: &[&str]) -> String {
        let user = UserRecord {
            id: id.to_string(),
            username: format!("user-{id}"),
            avatar: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        };
        let expires = chrono::Utc::now().timestamp() + 3600;
        encode_session(&self.signer, &user, expires)
    }

    /// A fresh client with no cookies.
    pub fn client(&self) -> super::client::TestClient {
        super::client::TestClient::new(self)
    }

    /// A client logged in as `id`.
    pub fn client_as(&self, id: &str) -> super::client::TestClient {
        let mut client = self.client();
        client.set_cookie(macrogate::gate::identity::SESSION_COOKIE, &self.session_for(id, &[]));
        client
    }

    /// A client logged in on the allow-list.
    pub fn admin(&self) -> super::client::TestClient {
        self.client_as(ADMIN_ID)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(tx) = self.challenge_shutdown.take() {
            let _ = tx.send(());
        }
    }
}
