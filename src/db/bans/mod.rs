//! Repository for the ban registry: banned identities and banned fingerprints.

mod models;
mod queries;

pub use models::{BannedFingerprint, BannedIdentity};
pub use queries::BanRepository;
