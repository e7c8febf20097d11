//! Per-artifact download counters.

use super::DbError;
use sqlx::SqlitePool;

/// Repository for download counters.
pub struct StatsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StatsRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensure a zeroed counter row exists for every id.
    pub async fn seed(&self, ids: &[String]) -> Result<(), DbError> {
        for id in ids {
            sqlx::query("INSERT OR IGNORE INTO stats (id, downloads) VALUES (?, 0)")
                .bind(id)
                .execute(self.pool)
                .await?;
        }
        Ok(())
    }

    /// Increment a counter in place. Returns `false` if no row exists for `id`.
    pub async fn increment(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE stats SET downloads = downloads + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// All counters, ordered by id.
    pub async fn all(&self) -> Result<Vec<(String, i64)>, DbError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT id, downloads FROM stats ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// A single counter.
    #[cfg(test)]
    pub async fn get(&self, id: &str) -> Result<Option<i64>, DbError> {
        let value = sqlx::query_scalar("SELECT downloads FROM stats WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    fn ids() -> Vec<String> {
        vec!["better-tiny-task".to_string(), "grow-garden".to_string()]
    }

    #[tokio::test]
    async fn seed_is_idempotent_and_keeps_counts() {
        let db = Database::new(":memory:").await.unwrap();
        let stats = db.stats();

        stats.seed(&ids()).await.unwrap();
        assert!(stats.increment("grow-garden").await.unwrap());
        stats.seed(&ids()).await.unwrap();

        assert_eq!(stats.get("grow-garden").await.unwrap(), Some(1));
        assert_eq!(stats.get("better-tiny-task").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn increment_unknown_id_touches_nothing() {
        let db = Database::new(":memory:").await.unwrap();
        let stats = db.stats();
        stats.seed(&ids()).await.unwrap();

        assert!(!stats.increment("not-a-macro").await.unwrap());
        assert_eq!(stats.all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let db = Database::new(":memory:").await.unwrap();
        db.stats().seed(&ids()).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..25 {
            let db = db.clone();
            tasks.push(tokio::spawn(async move {
                db.stats().increment("grow-garden").await.unwrap()
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap());
        }

        assert_eq!(db.stats().get("grow-garden").await.unwrap(), Some(25));
    }
}
