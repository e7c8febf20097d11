//! Device fingerprint resolution.
//!
//! Sources are tried in order: the signed cookie, then the raw cookie written
//! by the front-end. Either way the value is an untrusted hint.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::token::{Purpose, Signer};

/// Signed fingerprint cookie issued by the gate.
pub const SIGNED_FINGERPRINT_COOKIE: &str = "md_fp";
/// Unsigned fingerprint cookie written client-side.
pub const RAW_FINGERPRINT_COOKIE: &str = "fp";

const MAX_FINGERPRINT_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintSource {
    Signed,
    Unsigned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub value: String,
    pub source: FingerprintSource,
}

impl Fingerprint {
    /// Resolve the caller's fingerprint from the cookie jar.
    pub fn resolve(jar: &CookieJar, signer: &Signer) -> Option<Self> {
        let signed = jar
            .get(SIGNED_FINGERPRINT_COOKIE)
            .and_then(|c| signer.verify(Purpose::Fingerprint, c.value()))
            .and_then(|raw| String::from_utf8(raw).ok())
            .and_then(|v| sanitize(&v))
            .map(|value| Fingerprint {
                value,
                source: FingerprintSource::Signed,
            });

        signed.or_else(|| {
            jar.get(RAW_FINGERPRINT_COOKIE)
                .and_then(|c| sanitize(c.value()))
                .map(|value| Fingerprint {
                    value,
                    source: FingerprintSource::Unsigned,
                })
        })
    }

    /// Signed cookie pinning this fingerprint for later requests.
    pub fn pin_cookie(&self, signer: &Signer, secure: bool) -> Cookie<'static> {
        Cookie::build((
            SIGNED_FINGERPRINT_COOKIE,
            signer.sign(Purpose::Fingerprint, self.value.as_bytes()),
        ))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(365))
        .build()
    }
}

fn sanitize(raw: &str) -> Option<String> {
    let value = raw.trim();
    let ok = !value.is_empty()
        && value.len() <= MAX_FINGERPRINT_LEN
        && value.bytes().all(|b| b.is_ascii_graphic());
    ok.then(|| value.to_string())
}
