//! Ban registry with fingerprint escalation.
//!
//! Identities keep their first ban time; fingerprints record the latest
//! confirmed ban. When a banned identity shows up carrying a fingerprint, that
//! fingerprint is banned in its own right so the device stays locked out
//! under any other account.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::storage::{BanList, Storage, StorageError};

/// Which ban set a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanKind {
    Identity,
    Fingerprint,
}

impl BanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BanKind::Identity => "identity",
            BanKind::Fingerprint => "fingerprint",
        }
    }
}

impl fmt::Display for BanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ban type: {0}")]
pub struct UnknownBanKind(pub String);

impl FromStr for BanKind {
    type Err = UnknownBanKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" | "user" => Ok(BanKind::Identity),
            "fingerprint" | "fp" => Ok(BanKind::Fingerprint),
            _ => Err(UnknownBanKind(s.to_string())),
        }
    }
}

/// Ban registry over the shared store.
#[derive(Clone)]
pub struct BanRegistry {
    store: Arc<dyn Storage>,
}

impl BanRegistry {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    pub async fn is_identity_banned(&self, id: &str) -> Result<bool, StorageError> {
        self.store.is_identity_banned(id).await
    }

    pub async fn is_fingerprint_banned(&self, fp: &str) -> Result<bool, StorageError> {
        self.store.is_fingerprint_banned(fp).await
    }

    /// Ban an identity. Repeat calls keep the original ban time.
    pub async fn ban_identity(&self, id: &str) -> Result<bool, StorageError> {
        self.store.ban_identity(id, Self::now()).await
    }

    /// Ban a fingerprint, refreshing its ban time.
    pub async fn ban_fingerprint(&self, fp: &str) -> Result<(), StorageError> {
        self.store.ban_fingerprint(fp, Self::now()).await
    }

    pub async fn remove_ban(&self, kind: BanKind, value: &str) -> Result<u64, StorageError> {
        self.store.remove_ban(kind, value).await
    }

    pub async fn remove_blank_identity_bans(&self) -> Result<u64, StorageError> {
        self.store.remove_blank_identity_bans().await
    }

    pub async fn list_bans(&self) -> Result<BanList, StorageError> {
        self.store.list_bans().await
    }

    /// Promote the fingerprint of a caller whose identity ban was just confirmed.
    ///
    /// Returns whether a fingerprint was written.
    pub async fn escalate(&self, identity_id: &str, fingerprint: Option<&str>) -> bool {
        let Some(fp) = fingerprint else {
            return false;
        };
        match self.ban_fingerprint(fp).await {
            Ok(()) => {
                info!(identity = %identity_id, fingerprint = %fp, "Fingerprint banned by escalation");
                crate::metrics::record_escalation();
                true
            }
            Err(e) => {
                warn!(identity = %identity_id, fingerprint = %fp, error = %e, "Failed to escalate fingerprint ban");
                false
            }
        }
    }

    /// Insert the configured starting set of banned identities.
    ///
    /// Returns how many were new.
    pub async fn seed(&self, ids: &[String]) -> Result<usize, StorageError> {
        let mut inserted = 0;
        for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
            if self.ban_identity(id).await? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}
