//! Identity ban operations.

use super::super::models::BannedIdentity;
use crate::db::DbError;
use sqlx::SqlitePool;

/// Ban an identity. Returns `false` when it was already banned.
///
/// The first ban time wins: an existing row is never touched.
pub async fn ban_identity(pool: &SqlitePool, id: &str, banned_at: i64) -> Result<bool, DbError> {
    let result = sqlx::query("INSERT OR IGNORE INTO banned_users (id, banned_at) VALUES (?, ?)")
        .bind(id)
        .bind(banned_at)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Check whether an identity is banned.
pub async fn is_identity_banned(pool: &SqlitePool, id: &str) -> Result<bool, DbError> {
    let row: Option<i64> = sqlx::query_scalar("SELECT 1 FROM banned_users WHERE id = ? LIMIT 1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

/// Remove an identity ban. Returns the number of rows removed.
pub async fn remove_identity_ban(pool: &SqlitePool, id: &str) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM banned_users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Remove identity rows whose id is blank. Returns the number of rows removed.
pub async fn remove_blank_identity_bans(pool: &SqlitePool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM banned_users WHERE id IS NULL OR TRIM(id) = ''")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// List banned identities, newest first.
pub async fn list_identity_bans(pool: &SqlitePool) -> Result<Vec<BannedIdentity>, DbError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT id, banned_at
        FROM banned_users
        ORDER BY banned_at DESC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, banned_at)| BannedIdentity { id, banned_at })
        .collect())
}
