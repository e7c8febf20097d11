//! Sticky ban marker.
//!
//! Issued to a client the first time its identity ban is confirmed. The marker
//! is a signed capability with an issue and expiry time; checking it needs the
//! signing key and the clock, nothing else. Lifting the identity ban does not
//! revoke it.

use axum_extra::extract::cookie::{Cookie, SameSite};

use super::token::{Purpose, Signer};

/// Cookie carrying the marker.
pub const STICKY_BAN_COOKIE: &str = "md_hold";

const VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickyBan {
    pub issued_at: i64,
    pub expires_at: i64,
}

impl StickyBan {
    pub fn issue(now: i64, lifetime_days: u32) -> Self {
        Self {
            issued_at: now,
            expires_at: now.saturating_add(i64::from(lifetime_days) * 86_400),
        }
    }

    pub fn encode(&self, signer: &Signer) -> String {
        let payload = format!("{VERSION}:{}:{}", self.issued_at, self.expires_at);
        signer.sign(Purpose::StickyBan, payload.as_bytes())
    }

    /// Decode a marker, rejecting bad signatures, malformed payloads and
    /// expired markers.
    pub fn verify(signer: &Signer, token: &str, now: i64) -> Option<Self> {
        let payload = signer.verify(Purpose::StickyBan, token)?;
        let payload = std::str::from_utf8(&payload).ok()?;

        let mut parts = payload.split(':');
        if parts.next()? != VERSION {
            return None;
        }
        let issued_at = parts.next()?.parse().ok()?;
        let expires_at = parts.next()?.parse().ok()?;
        if parts.next().is_some() || expires_at <= now {
            return None;
        }

        Some(Self {
            issued_at,
            expires_at,
        })
    }

    /// Build the long-lived cookie for this marker.
    pub fn cookie(&self, signer: &Signer, secure: bool) -> Cookie<'static> {
        let lifetime = (self.expires_at - self.issued_at).max(0);
        Cookie::build((STICKY_BAN_COOKIE, self.encode(signer)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(time::Duration::seconds(lifetime))
            .build()
    }
}
