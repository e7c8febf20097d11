//! Key/value settings, currently the maintenance mode pair.

use super::DbError;
use serde::Serialize;
use sqlx::SqlitePool;

const MAINTENANCE_ENABLED: &str = "maintenance_enabled";
const MAINTENANCE_HTML: &str = "maintenance_html";

/// Maintenance mode state, read on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceConfig {
    pub enabled: bool,
    pub page_html: String,
}

/// Repository for settings.
pub struct SettingsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SettingsRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Write a raw setting (upsert).
    pub async fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Read the maintenance pair in one statement.
    pub async fn maintenance(&self) -> Result<MaintenanceConfig, DbError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT key, value FROM settings WHERE key IN (?, ?)",
        )
        .bind(MAINTENANCE_ENABLED)
        .bind(MAINTENANCE_HTML)
        .fetch_all(self.pool)
        .await?;

        let mut config = MaintenanceConfig::default();
        for (key, value) in rows {
            match key.as_str() {
                MAINTENANCE_ENABLED => config.enabled = value == "1",
                MAINTENANCE_HTML => config.page_html = value,
                _ => {}
            }
        }
        Ok(config)
    }

    pub async fn set_maintenance_enabled(&self, enabled: bool) -> Result<(), DbError> {
        self.set(MAINTENANCE_ENABLED, if enabled { "1" } else { "0" })
            .await
    }

    pub async fn set_maintenance_html(&self, html: &str) -> Result<(), DbError> {
        self.set(MAINTENANCE_HTML, html).await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn maintenance_defaults_off() {
        let db = Database::new(":memory:").await.unwrap();
        let config = db.settings().maintenance().await.unwrap();
        assert!(!config.enabled);
        assert!(config.page_html.is_empty());
    }

    #[tokio::test]
    async fn maintenance_fields_update_independently() {
        let db = Database::new(":memory:").await.unwrap();
        let settings = db.settings();

        settings.set_maintenance_html("<h1>brb</h1>").await.unwrap();
        settings.set_maintenance_enabled(true).await.unwrap();
        let config = settings.maintenance().await.unwrap();
        assert!(config.enabled);
        assert_eq!(config.page_html, "<h1>brb</h1>");

        settings.set_maintenance_enabled(false).await.unwrap();
        let config = settings.maintenance().await.unwrap();
        assert!(!config.enabled);
        assert_eq!(config.page_html, "<h1>brb</h1>");
    }
}
