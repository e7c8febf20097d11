//! Storage seam for ban, settings and counter state.
//!
//! The gate, the download controller and the admin console only ever talk to
//! [`Storage`]. Every method maps to one atomic statement against a single
//! logical row (listings aside), and nothing is cached between calls.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::db::{BannedFingerprint, BannedIdentity, Database, DbError, MaintenanceConfig};
use crate::security::BanKind;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Both ban sets, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BanList {
    pub identities: Vec<BannedIdentity>,
    pub fingerprints: Vec<BannedFingerprint>,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn is_identity_banned(&self, id: &str) -> Result<bool, StorageError>;

    async fn is_fingerprint_banned(&self, fp: &str) -> Result<bool, StorageError>;

    /// Insert-if-absent. Returns whether a new row was written.
    async fn ban_identity(&self, id: &str, banned_at: i64) -> Result<bool, StorageError>;

    /// Upsert that refreshes `banned_at`.
    async fn ban_fingerprint(&self, fp: &str, banned_at: i64) -> Result<(), StorageError>;

    /// Delete one ban row. Returns the number of rows removed.
    async fn remove_ban(&self, kind: BanKind, value: &str) -> Result<u64, StorageError>;

    async fn remove_blank_identity_bans(&self) -> Result<u64, StorageError>;

    async fn list_bans(&self) -> Result<BanList, StorageError>;

    async fn maintenance(&self) -> Result<MaintenanceConfig, StorageError>;

    async fn set_maintenance_enabled(&self, enabled: bool) -> Result<(), StorageError>;

    async fn set_maintenance_html(&self, html: &str) -> Result<(), StorageError>;

    async fn seed_counters(&self, ids: &[String]) -> Result<(), StorageError>;

    /// In-place `downloads + 1`. Returns `false` when no counter row exists.
    async fn increment_downloads(&self, id: &str) -> Result<bool, StorageError>;

    async fn download_counts(&self) -> Result<Vec<(String, i64)>, StorageError>;
}

#[async_trait]
impl Storage for Database {
    async fn is_identity_banned(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.bans().is_identity_banned(id).await?)
    }

    async fn is_fingerprint_banned(&self, fp: &str) -> Result<bool, StorageError> {
        Ok(self.bans().is_fingerprint_banned(fp).await?)
    }

    async fn ban_identity(&self, id: &str, banned_at: i64) -> Result<bool, StorageError> {
        Ok(self.bans().ban_identity(id, banned_at).await?)
    }

    async fn ban_fingerprint(&self, fp: &str, banned_at: i64) -> Result<(), StorageError> {
        Ok(self.bans().ban_fingerprint(fp, banned_at).await?)
    }

    async fn remove_ban(&self, kind: BanKind, value: &str) -> Result<u64, StorageError> {
        let bans = self.bans();
        let removed = match kind {
            BanKind::Identity => bans.remove_identity_ban(value).await?,
            BanKind::Fingerprint => bans.remove_fingerprint_ban(value).await?,
        };
        Ok(removed)
    }

    async fn remove_blank_identity_bans(&self) -> Result<u64, StorageError> {
        Ok(self.bans().remove_blank_identity_bans().await?)
    }

    async fn list_bans(&self) -> Result<BanList, StorageError> {
        let bans = self.bans();
        Ok(BanList {
            identities: bans.list_identity_bans().await?,
            fingerprints: bans.list_fingerprint_bans().await?,
        })
    }

    async fn maintenance(&self) -> Result<MaintenanceConfig, StorageError> {
        Ok(self.settings().maintenance().await?)
    }

    async fn set_maintenance_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        Ok(self.settings().set_maintenance_enabled(enabled).await?)
    }

    async fn set_maintenance_html(&self, html: &str) -> Result<(), StorageError> {
        Ok(self.settings().set_maintenance_html(html).await?)
    }

    async fn seed_counters(&self, ids: &[String]) -> Result<(), StorageError> {
        Ok(self.stats().seed(ids).await?)
    }

    async fn increment_downloads(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.stats().increment(id).await?)
    }

    async fn download_counts(&self) -> Result<Vec<(String, i64)>, StorageError> {
        Ok(self.stats().all().await?)
    }
}
