//! Ban entry models and data structures.

use serde::Serialize;

/// A banned login identity.
///
/// `banned_at` records the first ban; repeat bans leave it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannedIdentity {
    /// Opaque identity id from the OAuth provider.
    pub id: String,
    /// Unix timestamp of the first ban.
    pub banned_at: i64,
}

/// A banned device fingerprint.
///
/// `banned_at` records the most recent confirmed ban.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannedFingerprint {
    /// Opaque fingerprint token.
    pub fingerprint: String,
    /// Unix timestamp of the latest ban.
    pub banned_at: i64,
}
