//! Database query methods for ban operations.

pub mod fingerprint;
pub mod identity;

use crate::db::DbError;
use sqlx::SqlitePool;

/// Generate repository wrapper methods that forward to module-level functions.
macro_rules! ban_repository_methods {
    (
        $(
            $(#[$meta:meta])*
            fn $method_name:ident($($arg:ident: $arg_ty:ty),*) -> $ret_ty:ty
                => $module:ident::$fn_name:ident;
        )*
    ) => {
        $(
            $(#[$meta])*
            pub async fn $method_name(&self, $($arg: $arg_ty),*) -> $ret_ty {
                $module::$fn_name(self.pool, $($arg),*).await
            }
        )*
    };
}

/// Repository for ban operations.
pub struct BanRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BanRepository<'a> {
    /// Create a new ban repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    ban_repository_methods! {
        // ========== Identity bans ==========

        /// Ban an identity (insert-if-absent). Returns whether a row was inserted.
        fn ban_identity(id: &str, banned_at: i64) -> Result<bool, DbError>
            => identity::ban_identity;

        /// Check if an identity is banned.
        fn is_identity_banned(id: &str) -> Result<bool, DbError>
            => identity::is_identity_banned;

        /// Remove an identity ban.
        fn remove_identity_ban(id: &str) -> Result<u64, DbError>
            => identity::remove_identity_ban;

        /// Remove identity bans with a blank id.
        fn remove_blank_identity_bans() -> Result<u64, DbError>
            => identity::remove_blank_identity_bans;

        /// List identity bans, newest first.
        fn list_identity_bans() -> Result<Vec<super::models::BannedIdentity>, DbError>
            => identity::list_identity_bans;

        // ========== Fingerprint bans ==========

        /// Ban a fingerprint (upsert, refreshes `banned_at`).
        fn ban_fingerprint(fp: &str, banned_at: i64) -> Result<(), DbError>
            => fingerprint::ban_fingerprint;

        /// Check if a fingerprint is banned.
        fn is_fingerprint_banned(fp: &str) -> Result<bool, DbError>
            => fingerprint::is_fingerprint_banned;

        /// Remove a fingerprint ban.
        fn remove_fingerprint_ban(fp: &str) -> Result<u64, DbError>
            => fingerprint::remove_fingerprint_ban;

        /// List fingerprint bans, most recent first.
        fn list_fingerprint_bans() -> Result<Vec<super::models::BannedFingerprint>, DbError>
            => fingerprint::list_fingerprint_bans;
    }
}
