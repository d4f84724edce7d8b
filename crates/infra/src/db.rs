//! Database plumbing shared by the durable stores (SQLite via `sqlx`).

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use stockbridge_core::SyncError;

/// Store-level error shared by mapping, sync-log and settings stores.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn poisoned() -> Self {
        StoreError::Backend("lock poisoned".to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::Backend(value.to_string())
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        SyncError::storage(value.to_string())
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS mappings (
        storefront_id         TEXT PRIMARY KEY NOT NULL,
        warehouse_id          TEXT NOT NULL,
        warehouse_name        TEXT NOT NULL,
        inventory_location_id TEXT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sync_log (
        seq           INTEGER PRIMARY KEY AUTOINCREMENT,
        id            TEXT NOT NULL UNIQUE,
        storefront_id TEXT NOT NULL,
        warehouse_id  TEXT NOT NULL,
        status        TEXT NOT NULL,
        message       TEXT NOT NULL,
        timestamp     TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS sync_log_storefront ON sync_log (storefront_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS sync_log_timestamp ON sync_log (timestamp)",
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        id                    INTEGER PRIMARY KEY CHECK (id = 1),
        warehouse_credential  TEXT NULL,
        storefront_credential TEXT NULL,
        sync_interval_minutes INTEGER NOT NULL DEFAULT 0
    )
    "#,
];

/// Open a pool for `url` (creating the file if needed) and apply the schema.
pub async fn connect(url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database (tests/dev).
///
/// `sqlite::memory:` is per connection, so the pool must never open a second one.
pub async fn connect_in_memory() -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Create tables and indexes; idempotent.
pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Fixed-width RFC 3339 UTC text, so lexical order equals time order.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("invalid timestamp {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexically() {
        let early = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let late = early + chrono::Duration::milliseconds(1);
        assert!(encode_timestamp(&early) < encode_timestamp(&late));
        assert_eq!(decode_timestamp(&encode_timestamp(&early)).unwrap(), early);
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        migrate(&pool).await.unwrap();
        migrate(&pool).await.unwrap();
    }
}
