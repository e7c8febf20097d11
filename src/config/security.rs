//! Security configuration for cookie signing and the sticky ban marker.

use serde::Deserialize;

use super::defaults::{default_sticky_ban_days, default_true};

/// Secrets shorter than this are refused at startup.
pub const MIN_SECRET_LEN: usize = 32;

/// Secrets shipped in sample configs; never acceptable in production.
const KNOWN_WEAK_SECRETS: &[&str] = &["changeme", "secret", "macrogate", "change-me-please", "replace-with"];

/// Security configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// HMAC key for session, fingerprint and ban-marker cookies.
    /// Required: it must outlive restarts and be shared with the login flow.
    #[serde(default)]
    pub cookie_secret: String,
    /// Lifetime of the sticky ban marker in days.
    #[serde(default = "default_sticky_ban_days")]
    pub sticky_ban_days: u32,
    /// Mark issued cookies `Secure` (HTTPS only).
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cookie_secret: String::new(),
            sticky_ban_days: default_sticky_ban_days(),
            secure_cookies: true,
        }
    }
}

/// Whether a cookie secret is too weak to run with.
pub fn is_weak_secret(secret: &str) -> bool {
    let lowered = secret.to_ascii_lowercase();
    secret.len() < MIN_SECRET_LEN || KNOWN_WEAK_SECRETS.iter().any(|w| lowered.contains(w))
}
