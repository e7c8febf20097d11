//! Security module for macrogate.
//!
//! Provides the pieces the access gate is built from:
//! - **Signer**: HMAC-SHA256 signed cookie values
//! - **Sticky ban**: long-lived signed ban marker, checked without the database
//! - **Fingerprint**: ordered signed/unsigned device fingerprint lookup
//! - **Ban registry**: identity and fingerprint bans with escalation
//! - **Challenge**: fail-closed captcha verification
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Security Module                        │
//! ├──────────┬────────────┬─────────────┬───────────┬────────────┤
//! │  Signer  │ StickyBan  │ Fingerprint │ Registry  │ Challenge  │
//! │ HMAC-256 │ signed cap │ signed→raw  │ id + fp   │ siteverify │
//! └──────────┴────────────┴─────────────┴───────────┴────────────┘
//! ```

pub mod challenge;
pub mod fingerprint;
pub mod registry;
pub mod sticky;
pub mod token;

pub use challenge::{ChallengeVerifier, HttpChallengeVerifier};
pub use fingerprint::{Fingerprint, FingerprintSource};
pub use registry::{BanKind, BanRegistry, UnknownBanKind};
pub use sticky::StickyBan;
pub use token::{Purpose, Signer};
