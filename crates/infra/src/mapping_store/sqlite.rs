//! SQLite-backed mapping store.
//!
//! The storefront id is the primary key, and an upsert is a single
//! `INSERT … ON CONFLICT DO UPDATE` statement, so a concurrent reader sees
//! either the old or the new record, never a mix of the two.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use stockbridge_core::{LocationId, Mapping, StorefrontId, WarehouseId};

use super::MappingStore;
use crate::db::StoreError;

const UPSERT: &str = r#"
    INSERT INTO mappings (storefront_id, warehouse_id, warehouse_name, inventory_location_id)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (storefront_id)
    DO UPDATE SET
        warehouse_id = excluded.warehouse_id,
        warehouse_name = excluded.warehouse_name,
        inventory_location_id = excluded.inventory_location_id
"#;

#[derive(Debug, Clone)]
pub struct SqliteMappingStore {
    pool: SqlitePool,
}

impl SqliteMappingStore {
    /// Expects the schema from [`crate::db::migrate`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn bind_upsert<'q>(
    mapping: &'q Mapping,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    sqlx::query(UPSERT)
        .bind(mapping.storefront_id.as_str())
        .bind(mapping.warehouse_id.as_str())
        .bind(mapping.warehouse_name.as_str())
        .bind(mapping.inventory_location_id.as_ref().map(|l| l.as_str()))
}

fn row_to_mapping(row: &SqliteRow) -> Result<Mapping, StoreError> {
    let storefront_id: String = row.try_get("storefront_id")?;
    let warehouse_id: String = row.try_get("warehouse_id")?;
    let warehouse_name: String = row.try_get("warehouse_name")?;
    let location: Option<String> = row.try_get("inventory_location_id")?;

    Ok(Mapping {
        storefront_id: StorefrontId::new(storefront_id),
        warehouse_id: WarehouseId::new(warehouse_id),
        warehouse_name,
        inventory_location_id: location.map(LocationId::new),
    })
}

#[async_trait::async_trait]
impl MappingStore for SqliteMappingStore {
    async fn upsert(&self, mapping: Mapping) -> Result<(), StoreError> {
        bind_upsert(&mapping).execute(&self.pool).await?;
        Ok(())
    }

    async fn upsert_many(&self, mappings: Vec<Mapping>) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for mapping in &mappings {
            bind_upsert(mapping).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, storefront_id: &StorefrontId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM mappings WHERE storefront_id = ?1")
            .bind(storefront_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, storefront_id: &StorefrontId) -> Result<Option<Mapping>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT storefront_id, warehouse_id, warehouse_name, inventory_location_id
            FROM mappings
            WHERE storefront_id = ?1
            "#,
        )
        .bind(storefront_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_mapping).transpose()
    }

    async fn list(&self) -> Result<Vec<Mapping>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT storefront_id, warehouse_id, warehouse_name, inventory_location_id
            FROM mappings
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_mapping).collect()
    }
}
