//! Per-request caller resolution.
//!
//! The OAuth handshake lives outside this crate; it leaves a signed session
//! cookie holding the resolved user record. Anything missing, forged or
//! expired resolves to "unauthenticated".

use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::config::AccessConfig;
use crate::security::fingerprint::Fingerprint;
use crate::security::sticky::{STICKY_BAN_COOKIE, StickyBan};
use crate::security::{Purpose, Signer};

/// Session cookie written by the login flow.
pub const SESSION_COOKIE: &str = "md_session";

/// Identity record supplied by the login provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    user: UserRecord,
    exp: i64,
}

/// Encode a session for `user`, valid until `expires_at`.
pub fn encode_session(signer: &Signer, user: &UserRecord, expires_at: i64) -> String {
    let claims = SessionClaims {
        user: user.clone(),
        exp: expires_at,
    };
    // Serializing plain strings into a Vec cannot fail.
    let payload = serde_json::to_vec(&claims).unwrap_or_default();
    signer.sign(Purpose::Session, &payload)
}

fn decode_session(signer: &Signer, token: &str, now: i64) -> Option<UserRecord> {
    let payload = signer.verify(Purpose::Session, token)?;
    let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
    if claims.exp <= now || claims.user.id.trim().is_empty() {
        return None;
    }
    Some(claims.user)
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    #[serde(flatten)]
    pub record: UserRecord,
    pub privileged: bool,
}

impl Identity {
    /// Derive the privilege flag from the allow-list and privileged roles.
    pub fn new(record: UserRecord, access: &AccessConfig) -> Self {
        let privileged = access.allow_list.contains(&record.id)
            || record
                .roles
                .iter()
                .any(|role| access.privileged_roles.contains(role));
        Self { record, privileged }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }
}

/// Everything the gate knows about the caller.
#[derive(Debug, Clone, Default)]
pub struct IdentityContext {
    pub identity: Option<Identity>,
    pub fingerprint: Option<Fingerprint>,
    pub sticky: Option<StickyBan>,
}

impl IdentityContext {
    pub fn resolve(jar: &CookieJar, signer: &Signer, access: &AccessConfig, now: i64) -> Self {
        let identity = jar
            .get(SESSION_COOKIE)
            .and_then(|c| decode_session(signer, c.value(), now))
            .map(|record| Identity::new(record, access));
        let fingerprint = Fingerprint::resolve(jar, signer);
        let sticky = jar
            .get(STICKY_BAN_COOKIE)
            .and_then(|c| StickyBan::verify(signer, c.value(), now));

        Self {
            identity,
            fingerprint,
            sticky,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.identity.as_ref().is_some_and(|i| i.privileged)
    }

    pub fn fingerprint_value(&self) -> Option<&str> {
        self.fingerprint.as_ref().map(|f| f.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Cookie;

    fn signer() -> Signer {
        Signer::new("identity-test-secret-0123456789abcdef")
    }

    fn user(id: &str, roles: &[&str]) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: format!("user{id}"),
            avatar: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn access() -> AccessConfig {
        let mut access = AccessConfig::default();
        access.allow_list.insert("1".to_string());
        access.privileged_roles.insert("staff".to_string());
        access
    }

    #[test]
    fn privilege_from_allow_list_or_role() {
        assert!(Identity::new(user("1", &[]), &access()).privileged);
        assert!(Identity::new(user("2", &["member", "staff"]), &access()).privileged);
        assert!(!Identity::new(user("3", &["member"]), &access()).privileged);
    }

    #[test]
    fn session_roundtrip_and_expiry() {
        let token = encode_session(&signer(), &user("5", &[]), 100);
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, token));

        let ctx = IdentityContext::resolve(&jar, &signer(), &access(), 50);
        assert_eq!(ctx.identity.as_ref().map(Identity::id), Some("5"));
        assert!(!ctx.is_privileged());

        let expired = IdentityContext::resolve(&jar, &signer(), &access(), 100);
        assert!(expired.identity.is_none());
    }

    #[test]
    fn unsigned_session_is_ignored() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, r#"{"user":{"id":"1"}}"#));
        let ctx = IdentityContext::resolve(&jar, &signer(), &access(), 0);
        assert!(ctx.identity.is_none());
        assert!(ctx.fingerprint.is_none());
        assert!(ctx.sticky.is_none());
    }

    #[test]
    fn sticky_marker_is_picked_up() {
        let marker = StickyBan::issue(10, 1);
        let jar = CookieJar::new().add(marker.cookie(&signer(), false));
        let ctx = IdentityContext::resolve(&jar, &signer(), &access(), 20);
        assert_eq!(ctx.sticky, Some(marker));
    }
}
