//! Captcha verification endpoint configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{default_challenge_timeout_secs, default_verify_url};

#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeConfig {
    /// `siteverify`-style endpoint (hCaptcha, Turnstile and reCAPTCHA share the shape).
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
    /// Server-side secret sent alongside each token.
    pub secret: String,
    /// Upper bound on a single verification round trip.
    #[serde(default = "default_challenge_timeout_secs")]
    pub timeout_secs: u64,
}

impl ChallengeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
