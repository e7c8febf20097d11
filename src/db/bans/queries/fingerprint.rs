//! Fingerprint ban operations.

use super::super::models::BannedFingerprint;
use crate::db::DbError;
use sqlx::SqlitePool;

/// Ban a fingerprint, refreshing `banned_at` if it is already banned.
pub async fn ban_fingerprint(pool: &SqlitePool, fp: &str, banned_at: i64) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO banned_fp (fp, banned_at)
        VALUES (?, ?)
        ON CONFLICT(fp) DO UPDATE SET banned_at = excluded.banned_at
        "#,
    )
    .bind(fp)
    .bind(banned_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Check whether a fingerprint is banned.
pub async fn is_fingerprint_banned(pool: &SqlitePool, fp: &str) -> Result<bool, DbError> {
    let row: Option<i64> = sqlx::query_scalar("SELECT 1 FROM banned_fp WHERE fp = ? LIMIT 1")
        .bind(fp)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

/// Remove a fingerprint ban. Returns the number of rows removed.
pub async fn remove_fingerprint_ban(pool: &SqlitePool, fp: &str) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM banned_fp WHERE fp = ?")
        .bind(fp)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// List banned fingerprints, most recently detected first.
pub async fn list_fingerprint_bans(pool: &SqlitePool) -> Result<Vec<BannedFingerprint>, DbError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT fp, banned_at
        FROM banned_fp
        ORDER BY banned_at DESC, fp ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(fingerprint, banned_at)| BannedFingerprint {
            fingerprint,
            banned_at,
        })
        .collect())
}
