use sqlx::{Row, SqlitePool};

use super::{SettingsStore, SyncSettings};
use crate::db::StoreError;

/// Settings kept in the single-row `settings` table (id = 1).
#[derive(Debug, Clone)]
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn load(&self) -> Result<SyncSettings, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT warehouse_credential, storefront_credential, sync_interval_minutes
            FROM settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(SyncSettings::default());
        };

        let minutes: i64 = row.try_get("sync_interval_minutes")?;
        Ok(SyncSettings {
            warehouse_credential: row.try_get("warehouse_credential")?,
            storefront_credential: row.try_get("storefront_credential")?,
            sync_interval_minutes: u32::try_from(minutes)
                .map_err(|_| StoreError::Corrupt(format!("sync_interval_minutes = {minutes}")))?,
        })
    }

    async fn save(&self, settings: &SyncSettings) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO settings (id, warehouse_credential, storefront_credential, sync_interval_minutes)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT (id)
            DO UPDATE SET
                warehouse_credential = excluded.warehouse_credential,
                storefront_credential = excluded.storefront_credential,
                sync_interval_minutes = excluded.sync_interval_minutes
            "#,
        )
        .bind(settings.warehouse_credential.as_deref())
        .bind(settings.storefront_credential.as_deref())
        .bind(i64::from(settings.sync_interval_minutes))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
