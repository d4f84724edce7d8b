//! SQLite-backed sync log.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use stockbridge_core::{
    LogFilter, Page, Pagination, StorefrontId, SyncLogEntry, SyncLogId, SyncStatus, WarehouseId,
};

use super::SyncLogStore;
use crate::db::{StoreError, decode_timestamp, encode_timestamp};

// Every optional filter binds NULL when unset.
const WHERE_FILTER: &str = r#"
    WHERE (?1 IS NULL OR storefront_id = ?1)
      AND (?2 IS NULL OR status = ?2)
      AND (?3 IS NULL OR timestamp >= ?3)
"#;

const COLUMNS: &str = "id, storefront_id, warehouse_id, status, message, timestamp";

#[derive(Debug, Clone)]
pub struct SqliteSyncLogStore {
    pool: SqlitePool,
}

impl SqliteSyncLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn select(
        &self,
        filter: &LogFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SyncLogEntry>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM sync_log {WHERE_FILTER} \
             ORDER BY timestamp DESC, seq DESC LIMIT ?4 OFFSET ?5"
        );
        let since = filter.since.as_ref().map(encode_timestamp);
        let rows = sqlx::query(&sql)
            .bind(filter.storefront_id.as_ref().map(|id| id.as_str()))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(since)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_entry).collect()
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<SyncLogEntry, StoreError> {
    let id: String = row.try_get("id")?;
    let storefront_id: String = row.try_get("storefront_id")?;
    let warehouse_id: String = row.try_get("warehouse_id")?;
    let status: String = row.try_get("status")?;
    let message: String = row.try_get("message")?;
    let timestamp: String = row.try_get("timestamp")?;

    Ok(SyncLogEntry {
        id: id
            .parse::<SyncLogId>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        storefront_id: StorefrontId::new(storefront_id),
        warehouse_id: WarehouseId::new(warehouse_id),
        status: status
            .parse::<SyncStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        message,
        timestamp: decode_timestamp(&timestamp)?,
    })
}

#[async_trait::async_trait]
impl SyncLogStore for SqliteSyncLogStore {
    async fn append(&self, entry: SyncLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sync_log (id, storefront_id, warehouse_id, status, message, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.storefront_id.as_str())
        .bind(entry.warehouse_id.as_str())
        .bind(entry.status.as_str())
        .bind(&entry.message)
        .bind(encode_timestamp(&entry.timestamp))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query(
        &self,
        filter: &LogFilter,
        pagination: Pagination,
    ) -> Result<Page<SyncLogEntry>, StoreError> {
        let count_sql = format!("SELECT COUNT(*) FROM sync_log {WHERE_FILTER}");
        let since = filter.since.as_ref().map(encode_timestamp);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.storefront_id.as_ref().map(|id| id.as_str()))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        let items = self
            .select(filter, pagination.limit() as i64, pagination.offset() as i64)
            .await?;

        Ok(Page::from_parts(items, total.max(0) as u64, pagination))
    }

    async fn latest_for(
        &self,
        storefront_id: &StorefrontId,
    ) -> Result<Option<SyncLogEntry>, StoreError> {
        let filter = LogFilter::for_storefront(storefront_id.clone());
        Ok(self.select(&filter, 1, 0).await?.into_iter().next())
    }

    async fn delete_for(&self, storefront_id: &StorefrontId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sync_log WHERE storefront_id = ?1")
            .bind(storefront_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn since(&self, since: DateTime<Utc>) -> Result<Vec<SyncLogEntry>, StoreError> {
        // SQLite treats a negative LIMIT as "no limit".
        self.select(&LogFilter::since(since), -1, 0).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::TimeZone;
    use stockbridge_core::Mapping;

    async fn store() -> SqliteSyncLogStore {
        SqliteSyncLogStore::new(db::connect_in_memory().await.unwrap())
    }

    fn entry(storefront: &str, minute: u32, status: SyncStatus) -> SyncLogEntry {
        SyncLogEntry::new(
            &Mapping::new(storefront, "W1", "mug"),
            status,
            format!("m{minute}"),
            Utc.with_ymd_and_hms(2026, 5, 1, 12, minute, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn appended_entries_read_back_intact() {
        let log = store().await;
        let original = entry("S1", 7, SyncStatus::Success);
        log.append(original.clone()).await.unwrap();

        let latest = log.latest_for(&StorefrontId::new("S1")).await.unwrap();
        assert_eq!(latest, Some(original));
        assert_eq!(log.latest_for(&StorefrontId::new("S2")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn filtered_page_reports_full_total() {
        let log = store().await;
        for minute in 0..5 {
            log.append(entry("S1", minute, SyncStatus::Error)).await.unwrap();
        }
        log.append(entry("S2", 30, SyncStatus::Error)).await.unwrap();

        let filter = LogFilter::for_storefront(StorefrontId::new("S1"));
        let page = log.query(&filter, Pagination::new(1, 2)).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        let messages: Vec<_> = page.items.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["m4", "m3"]);
    }

    #[tokio::test]
    async fn equal_timestamps_fall_back_to_insertion_order() {
        let log = store().await;
        let first = entry("S1", 1, SyncStatus::Success);
        let mut second = entry("S1", 1, SyncStatus::Error);
        second.message = "second".into();
        log.append(first).await.unwrap();
        log.append(second).await.unwrap();

        let latest = log.latest_for(&StorefrontId::new("S1")).await.unwrap().unwrap();
        assert_eq!(latest.message, "second");
    }

    #[tokio::test]
    async fn since_and_delete() {
        let log = store().await;
        log.append(entry("S1", 1, SyncStatus::Success)).await.unwrap();
        log.append(entry("S1", 20, SyncStatus::Error)).await.unwrap();
        log.append(entry("S2", 40, SyncStatus::Success)).await.unwrap();

        let cutoff = Utc.with_ymd_and_hms(2026, 5, 1, 12, 10, 0).unwrap();
        let recent = log.since(cutoff).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].storefront_id.as_str(), "S2");

        assert_eq!(log.delete_for(&StorefrontId::new("S1")).await.unwrap(), 2);
        let rest = log.query(&LogFilter::default(), Pagination::default()).await.unwrap();
        assert_eq!(rest.total, 1);
    }
}
