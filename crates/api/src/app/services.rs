//! Production wiring: SQLite stores plus HTTP catalog adapters.

use std::sync::Arc;

use anyhow::Context;

use stockbridge_infra::SyncService;
use stockbridge_infra::config::AppConfig;
use stockbridge_infra::db;
use stockbridge_infra::external::{HttpStorefrontCatalog, HttpWarehouseCatalog};
use stockbridge_infra::mapping_store::SqliteMappingStore;
use stockbridge_infra::settings::{SettingsStore, SqliteSettingsStore};
use stockbridge_infra::sync_log::SqliteSyncLogStore;

pub async fn build_services(config: &AppConfig) -> anyhow::Result<Arc<SyncService>> {
    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("opening database {}", config.database_url))?;

    let settings: Arc<dyn SettingsStore> = Arc::new(SqliteSettingsStore::new(pool.clone()));

    let warehouse = HttpWarehouseCatalog::new(
        config.warehouse.clone(),
        settings.clone(),
        config.request_timeout,
    )
    .context("building warehouse client")?;
    let storefront = HttpStorefrontCatalog::new(
        config.storefront.clone(),
        settings.clone(),
        config.request_timeout,
    )
    .context("building storefront client")?;

    let service = SyncService::builder(
        Arc::new(SqliteMappingStore::new(pool.clone())),
        Arc::new(SqliteSyncLogStore::new(pool)),
        settings,
        Arc::new(warehouse),
        Arc::new(storefront),
    )
    .cache_ttl(config.cache_ttl)
    .warehouse_location(config.warehouse.depot_id.clone())
    .max_concurrent(config.max_concurrent)
    .build();

    Ok(Arc::new(service))
}
