//! HMAC-SHA256 signed cookie values.
//!
//! A token is `base64url(payload) "." base64url(tag)` where the tag covers the
//! purpose label and the encoded payload. The purpose label keeps a token
//! minted for one cookie from verifying as another.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// What a signed value is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Session,
    Fingerprint,
    StickyBan,
}

impl Purpose {
    fn label(self) -> &'static [u8] {
        match self {
            Purpose::Session => b"macrogate.session.v1",
            Purpose::Fingerprint => b"macrogate.fingerprint.v1",
            Purpose::StickyBan => b"macrogate.sticky-ban.v1",
        }
    }
}

/// Signs and verifies cookie values with a server secret.
#[derive(Clone)]
pub struct Signer {
    key: Arc<[u8]>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(secret: &str) -> Self {
        Self {
            key: Arc::from(secret.as_bytes()),
        }
    }

    fn tag(&self, purpose: Purpose, encoded: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(purpose.label());
        mac.update(b":");
        mac.update(encoded.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Produce a signed token for `payload`.
    pub fn sign(&self, purpose: Purpose, payload: &[u8]) -> String {
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let tag = URL_SAFE_NO_PAD.encode(self.tag(purpose, &encoded));
        format!("{encoded}.{tag}")
    }

    /// Return the payload if `token` carries a valid tag for `purpose`.
    pub fn verify(&self, purpose: Purpose, token: &str) -> Option<Vec<u8>> {
        let (encoded, tag) = token.rsplit_once('.')?;
        let provided = URL_SAFE_NO_PAD.decode(tag).ok()?;
        let expected = self.tag(purpose, encoded);
        if !bool::from(provided.ct_eq(&expected)) {
            return None;
        }
        URL_SAFE_NO_PAD.decode(encoded).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_and_tamper() {
        let signer = Signer::new("k1-0123456789abcdef0123456789abcdef");
        let token = signer.sign(Purpose::Fingerprint, b"device-42");
        assert_eq!(
            signer.verify(Purpose::Fingerprint, &token).as_deref(),
            Some(&b"device-42"[..])
        );

        let mut forged = token.clone();
        let last = forged.pop().unwrap();
        forged.push(if last == 'A' { 'Q' } else { 'A' });
        assert!(signer.verify(Purpose::Fingerprint, &forged).is_none());

        let (_, tag) = token.rsplit_once('.').unwrap();
        let swapped = format!("{}.{}", URL_SAFE_NO_PAD.encode(b"device-43"), tag);
        assert!(signer.verify(Purpose::Fingerprint, &swapped).is_none());
        assert!(signer.verify(Purpose::Fingerprint, "device-42").is_none());
        assert!(signer.verify(Purpose::Fingerprint, "").is_none());
    }

    #[test]
    fn purpose_and_key_are_bound() {
        let signer = Signer::new("k1-0123456789abcdef0123456789abcdef");
        let other = Signer::new("k2-0123456789abcdef0123456789abcdef");
        let token = signer.sign(Purpose::Session, b"{}");

        assert!(signer.verify(Purpose::StickyBan, &token).is_none());
        assert!(other.verify(Purpose::Session, &token).is_none());
    }
}
