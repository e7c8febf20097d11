//! Captcha challenge verification.
//!
//! Talks to a `siteverify`-style endpoint: the token, the server secret and the
//! requester address go out as a form POST, a JSON `{"success": bool}` comes
//! back. Verification fails closed: transport errors, timeouts, unparseable
//! replies and empty tokens all count as a rejection.

use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::ChallengeConfig;

#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    /// Whether `token` is a solved challenge for `remote`.
    async fn verify(&self, token: &str, remote: Option<IpAddr>) -> bool;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Verifier backed by the captcha provider's HTTP API.
pub struct HttpChallengeVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: String,
    timeout: Duration,
}

impl HttpChallengeVerifier {
    pub fn new(config: &ChallengeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("macrogate/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            verify_url: config.verify_url.clone(),
            secret: config.secret.clone(),
            timeout: config.timeout(),
        }
    }

    async fn round_trip(&self, token: &str, remote: Option<IpAddr>) -> bool {
        let remote = remote.map(|ip| ip.to_string());
        let mut form = vec![("secret", self.secret.as_str()), ("response", token)];
        if let Some(ip) = remote.as_deref() {
            form.push(("remoteip", ip));
        }

        let request = self.client.post(&self.verify_url).form(&form).send();
        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                warn!(error = %e, "Challenge verification request failed");
                return false;
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Challenge verification timed out");
                return false;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Challenge verification endpoint returned an error");
            return false;
        }

        match response.json::<SiteVerifyResponse>().await {
            Ok(body) => {
                if !body.success {
                    debug!(codes = ?body.error_codes, "Challenge rejected");
                }
                body.success
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse challenge verification response");
                false
            }
        }
    }
}

#[async_trait]
impl ChallengeVerifier for HttpChallengeVerifier {
    async fn verify(&self, token: &str, remote: Option<IpAddr>) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }

        let started = Instant::now();
        let ok = self.round_trip(token, remote).await;
        crate::metrics::record_challenge(ok, started.elapsed().as_secs_f64());
        ok
    }
}
