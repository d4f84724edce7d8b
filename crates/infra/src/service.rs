//! `SyncService`: the operations the HTTP layer (or any other caller) uses.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use stockbridge_core::{
    DailySyncCounts, LogFilter, Mapping, MappingStats, Page, Pagination, ProductFilter,
    StorefrontId, SyncError, SyncLogEntry, SyncResult, WarehouseProduct, window_start,
};

use crate::cache::{DEFAULT_TTL, InventoryCache};
use crate::external::{StorefrontCatalog, WarehouseCatalog};
use crate::mapping_store::MappingStore;
use crate::reader::WarehouseInventoryReader;
use crate::reconcile::Reconciler;
use crate::scheduler::{Scheduler, SchedulerConfig, SchedulerHandle, TickReport};
use crate::settings::{SettingsStore, SyncSettings};
use crate::sync_log::SyncLogStore;
use crate::writer::StorefrontInventoryWriter;

pub const DEFAULT_SUMMARY_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiStatus {
    pub warehouse: Connectivity,
    pub storefront: Connectivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub armed: bool,
    pub interval_minutes: Option<u64>,
}

impl SchedulerStatus {
    fn disarmed() -> Self {
        Self {
            armed: false,
            interval_minutes: None,
        }
    }

    fn of(handle: &SchedulerHandle) -> Self {
        Self {
            armed: handle.is_running(),
            interval_minutes: Some(handle.interval().as_secs() / 60),
        }
    }
}

pub struct SyncServiceBuilder {
    mappings: Arc<dyn MappingStore>,
    log: Arc<dyn SyncLogStore>,
    settings: Arc<dyn SettingsStore>,
    warehouse: Arc<dyn WarehouseCatalog>,
    storefront: Arc<dyn StorefrontCatalog>,
    cache_ttl: Duration,
    warehouse_location: Option<String>,
    max_concurrent: usize,
}

impl SyncServiceBuilder {
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Warehouse depot whose `available` figure is preferred.
    pub fn warehouse_location(mut self, location: Option<String>) -> Self {
        self.warehouse_location = location;
        self
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn build(self) -> SyncService {
        let cache = Arc::new(InventoryCache::new(self.cache_ttl));
        let reader = WarehouseInventoryReader::new(self.warehouse.clone(), cache)
            .with_location(self.warehouse_location.as_deref());
        let writer = StorefrontInventoryWriter::new(self.storefront.clone());
        let reconciler = Reconciler::new(reader, writer, self.log.clone());
        let scheduler = Scheduler::new(self.mappings.clone(), reconciler.clone());

        SyncService {
            mappings: self.mappings,
            log: self.log,
            settings: self.settings,
            warehouse: self.warehouse,
            storefront: self.storefront,
            reconciler,
            scheduler,
            max_concurrent: self.max_concurrent,
            armed: Mutex::new(None),
        }
    }
}

pub struct SyncService {
    mappings: Arc<dyn MappingStore>,
    log: Arc<dyn SyncLogStore>,
    settings: Arc<dyn SettingsStore>,
    warehouse: Arc<dyn WarehouseCatalog>,
    storefront: Arc<dyn StorefrontCatalog>,
    reconciler: Reconciler,
    scheduler: Scheduler,
    max_concurrent: usize,
    armed: Mutex<Option<SchedulerHandle>>,
}

impl SyncService {
    pub fn builder(
        mappings: Arc<dyn MappingStore>,
        log: Arc<dyn SyncLogStore>,
        settings: Arc<dyn SettingsStore>,
        warehouse: Arc<dyn WarehouseCatalog>,
        storefront: Arc<dyn StorefrontCatalog>,
    ) -> SyncServiceBuilder {
        SyncServiceBuilder {
            mappings,
            log,
            settings,
            warehouse,
            storefront,
            cache_ttl: DEFAULT_TTL,
            warehouse_location: None,
            max_concurrent: 4,
        }
    }

    pub fn cache(&self) -> &Arc<InventoryCache> {
        self.reconciler.reader().cache()
    }

    // ---- Mappings ----

    pub async fn get_mapping(&self, storefront_id: &StorefrontId) -> SyncResult<Mapping> {
        self.mappings
            .get(storefront_id)
            .await?
            .ok_or_else(|| SyncError::MappingNotFound(storefront_id.clone()))
    }

    /// All mappings, ordered by storefront id.
    pub async fn list_mappings(&self) -> SyncResult<Vec<Mapping>> {
        let mut all = self.mappings.list().await?;
        all.sort_by(|a, b| a.storefront_id.cmp(&b.storefront_id));
        Ok(all)
    }

    /// Create or replace one mapping without syncing it.
    pub async fn upsert_mapping(&self, mapping: Mapping) -> SyncResult<()> {
        mapping.validate()?;
        self.mappings.upsert(mapping).await?;
        Ok(())
    }

    /// Replace many mappings at once; nothing is written if any is invalid.
    pub async fn save_mappings(&self, mappings: Vec<Mapping>) -> SyncResult<usize> {
        for mapping in &mappings {
            mapping.validate()?;
        }
        let count = mappings.len();
        self.mappings.upsert_many(mappings).await?;
        info!(count, "mappings saved");
        Ok(count)
    }

    /// Link a product and sync it right away.
    #[instrument(skip(self, mapping), fields(storefront_id = %mapping.storefront_id))]
    pub async fn map_product(&self, mapping: Mapping) -> SyncResult<SyncLogEntry> {
        mapping.validate()?;
        self.mappings.upsert(mapping.clone()).await?;
        Ok(self.reconciler.reconcile(&mapping).await)
    }

    /// Remove a mapping and its audit entries. Absent ids are not an error.
    #[instrument(skip(self))]
    pub async fn unmap(&self, storefront_id: &StorefrontId) -> SyncResult<bool> {
        let removed = self.mappings.remove(storefront_id).await?;
        let cleared = self.log.delete_for(storefront_id).await?;
        info!(removed, cleared, "unmapped");
        Ok(removed)
    }

    // ---- Reconciliation ----

    /// Manual sync or retry of one mapping.
    pub async fn sync_mapping(&self, storefront_id: &StorefrontId) -> SyncResult<SyncLogEntry> {
        let mapping = self.get_mapping(storefront_id).await?;
        Ok(self.reconciler.reconcile(&mapping).await)
    }

    /// One tick over all mappings, now.
    pub async fn sync_all(&self) -> SyncResult<TickReport> {
        Ok(self.scheduler.run_tick(self.max_concurrent).await?)
    }

    // ---- Sync log ----

    pub async fn list_logs(
        &self,
        filter: &LogFilter,
        pagination: Pagination,
    ) -> SyncResult<Page<SyncLogEntry>> {
        Ok(self.log.query(filter, pagination).await?)
    }

    pub async fn clear_logs(&self, storefront_id: &StorefrontId) -> SyncResult<u64> {
        Ok(self.log.delete_for(storefront_id).await?)
    }

    pub async fn current_status(
        &self,
        storefront_id: &StorefrontId,
    ) -> SyncResult<Option<SyncLogEntry>> {
        Ok(self.log.latest_for(storefront_id).await?)
    }

    /// Per-day counts over the last `days` days, newest day first.
    pub async fn daily_summary(&self, days: u32) -> SyncResult<Vec<DailySyncCounts>> {
        let now = Utc::now();
        let since = window_start(now, days);
        let entries = self.log.since(since).await?;
        Ok(DailySyncCounts::summarize(&entries, now, days))
    }

    // ---- Stats and product listings ----

    async fn mapped_ids(&self) -> SyncResult<HashSet<StorefrontId>> {
        Ok(self
            .mappings
            .list()
            .await?
            .into_iter()
            .map(|m| m.storefront_id)
            .collect())
    }

    /// Mapped/unmapped counts over a caller-supplied product list.
    pub async fn mapping_stats(&self, products: &[StorefrontId]) -> SyncResult<MappingStats> {
        let mapped = self.mapped_ids().await?;
        Ok(MappingStats::compute(products, |id| mapped.contains(id)))
    }

    /// Mapped/unmapped counts over every storefront product.
    pub async fn storefront_mapping_stats(&self) -> SyncResult<MappingStats> {
        let products = self
            .storefront
            .list_product_ids()
            .await
            .map_err(|e| e.into_storefront_error())?;
        self.mapping_stats(&products).await
    }

    pub async fn filter_products(
        &self,
        products: Vec<StorefrontId>,
        filter: ProductFilter,
        pagination: Pagination,
    ) -> SyncResult<Page<StorefrontId>> {
        let mapped = self.mapped_ids().await?;
        Ok(filter.page(products, |id| mapped.contains(id), pagination))
    }

    /// Storefront catalog ids, filtered by mapping state and paged.
    pub async fn list_storefront_products(
        &self,
        filter: ProductFilter,
        pagination: Pagination,
    ) -> SyncResult<Page<StorefrontId>> {
        let products = self
            .storefront
            .list_product_ids()
            .await
            .map_err(|e| e.into_storefront_error())?;
        self.filter_products(products, filter, pagination).await
    }

    // ---- Catalog pass-through ----

    pub async fn search_warehouse(&self, query: &str) -> SyncResult<Vec<WarehouseProduct>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SyncError::validation("search query must not be empty"));
        }
        self.warehouse
            .search_by_name(query)
            .await
            .map_err(|e| e.into_warehouse_unavailable())
    }

    /// Probe both catalogs concurrently. Any failure, including missing
    /// credentials, reads as offline.
    pub async fn api_status(&self) -> ApiStatus {
        let (warehouse, storefront) =
            tokio::join!(self.warehouse.check_status(), self.storefront.check_status());
        let connectivity = |side: &str, check: Result<(), crate::external::CatalogError>| match check {
            Ok(()) => Connectivity::Online,
            Err(e) => {
                warn!(side, error = %e, "catalog offline");
                Connectivity::Offline
            }
        };
        ApiStatus {
            warehouse: connectivity("warehouse", warehouse),
            storefront: connectivity("storefront", storefront),
        }
    }

    // ---- Settings ----

    pub async fn settings(&self) -> SyncResult<SyncSettings> {
        Ok(self.settings.load().await?)
    }

    /// Persist settings. Credentials apply to the next catalog call; the
    /// interval only applies on the next arm.
    pub async fn update_settings(&self, settings: SyncSettings) -> SyncResult<()> {
        self.settings.save(&settings).await?;
        info!(interval_minutes = settings.sync_interval_minutes, "settings updated");
        Ok(())
    }

    // ---- Scheduler ----

    /// Arm from the persisted interval; 0 leaves the scheduler disabled.
    pub async fn start_scheduler_from_settings(&self) -> SyncResult<SchedulerStatus> {
        let minutes = self.settings.load().await?.sync_interval_minutes;
        if minutes == 0 {
            info!("sync interval not configured; scheduler disabled");
        }
        Ok(self.arm_scheduler(minutes).await)
    }

    /// Replace any armed scheduler; 0 minutes just disarms.
    pub async fn arm_scheduler(&self, interval_minutes: u32) -> SchedulerStatus {
        let mut armed = self.armed.lock().await;
        if let Some(previous) = armed.take() {
            previous.shutdown().await;
        }
        let Some(config) = SchedulerConfig::from_minutes(interval_minutes) else {
            return SchedulerStatus::disarmed();
        };
        let handle = self
            .scheduler
            .arm(config.with_max_concurrent(self.max_concurrent));
        let status = SchedulerStatus::of(&handle);
        *armed = Some(handle);
        status
    }

    pub async fn disarm_scheduler(&self) -> SchedulerStatus {
        if let Some(handle) = self.armed.lock().await.take() {
            handle.shutdown().await;
        }
        SchedulerStatus::disarmed()
    }

    pub async fn scheduler_status(&self) -> SchedulerStatus {
        self.armed
            .lock()
            .await
            .as_ref()
            .map(SchedulerStatus::of)
            .unwrap_or_else(SchedulerStatus::disarmed)
    }

    /// Stop the scheduler, letting a tick in progress finish.
    pub async fn shutdown(&self) {
        self.disarm_scheduler().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{CatalogError, InMemoryStorefront, InMemoryWarehouse};
    use crate::mapping_store::InMemoryMappingStore;
    use crate::settings::InMemorySettingsStore;
    use crate::sync_log::InMemorySyncLogStore;
    use stockbridge_core::{LocationId, SyncStatus, WarehouseId, WarehouseStock};

    struct Fixture {
        warehouse: Arc<InMemoryWarehouse>,
        storefront: Arc<InMemoryStorefront>,
        log: Arc<InMemorySyncLogStore>,
        service: SyncService,
    }

    fn fixture_with(settings: SyncSettings) -> Fixture {
        let warehouse = Arc::new(
            InMemoryWarehouse::new()
                .with_stock("W1", WarehouseStock::with_remain(42))
                .with_product(WarehouseProduct {
                    id: WarehouseId::new("W1"),
                    code: "MUG-B".into(),
                    name: "Blue mug".into(),
                }),
        );
        let storefront = Arc::new(InMemoryStorefront::new().with_products(["S1", "S2", "S3"]));
        let log = Arc::new(InMemorySyncLogStore::new());
        let service = SyncService::builder(
            Arc::new(InMemoryMappingStore::new()),
            log.clone(),
            Arc::new(InMemorySettingsStore::new(settings)),
            warehouse.clone(),
            storefront.clone(),
        )
        .build();
        Fixture {
            warehouse,
            storefront,
            log,
            service,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(SyncSettings::default())
    }

    #[tokio::test]
    async fn map_product_syncs_immediately() {
        let f = fixture();
        let entry = f
            .service
            .map_product(Mapping::new("S1", "W1", "Blue mug").with_location("L1"))
            .await
            .unwrap();

        assert_eq!(entry.status, SyncStatus::Success);
        assert_eq!(f.storefront.level(&LocationId::new("L1")), Some(42));
        assert_eq!(f.service.list_mappings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn manual_sync_of_unknown_mapping_logs_nothing() {
        let f = fixture();
        let err = f.service.sync_mapping(&StorefrontId::new("S9")).await.unwrap_err();
        assert_eq!(err, SyncError::MappingNotFound(StorefrontId::new("S9")));
        assert!(f.log.is_empty());
    }

    #[tokio::test]
    async fn unmap_cascades_to_logs_and_is_idempotent() {
        let f = fixture();
        f.service.map_product(Mapping::new("S1", "W1", "mug")).await.unwrap();
        f.service.map_product(Mapping::new("S2", "W1", "mug")).await.unwrap();
        assert_eq!(f.log.len(), 2);

        assert!(f.service.unmap(&StorefrontId::new("S1")).await.unwrap());
        assert!(!f.service.unmap(&StorefrontId::new("S1")).await.unwrap());
        assert_eq!(f.log.len(), 1);
        assert!(f.service.current_status(&StorefrontId::new("S1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_batch_writes_nothing() {
        let f = fixture();
        let err = f
            .service
            .save_mappings(vec![Mapping::new("S1", "W1", "a"), Mapping::new("S2", "", "b")])
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert!(f.service.list_mappings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_over_storefront_products() {
        let f = fixture();
        f.service
            .save_mappings(vec![Mapping::new("S1", "W1", "a"), Mapping::new("S3", "W1", "c")])
            .await
            .unwrap();

        let stats = f.service.storefront_mapping_stats().await.unwrap();
        assert_eq!(
            (stats.total_products, stats.mapped_count, stats.unmapped_count),
            (3, 2, 1)
        );

        let page = f
            .service
            .filter_products(
                vec![StorefrontId::new("S1"), StorefrontId::new("S2"), StorefrontId::new("S3")],
                ProductFilter::Unmapped,
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.items, vec![StorefrontId::new("S2")]);
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn sync_all_reports_each_mapping() {
        let f = fixture();
        f.service
            .save_mappings(vec![Mapping::new("S1", "W1", "a"), Mapping::new("S2", "W404", "b")])
            .await
            .unwrap();

        let report = f.service.sync_all().await.unwrap();
        assert_eq!((report.total, report.succeeded, report.failed), (2, 1, 1));

        let summary = f.service.daily_summary(DEFAULT_SUMMARY_DAYS).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!((summary[0].success, summary[0].error), (1, 1));

        let everything = f.service.daily_summary(u32::MAX).await.unwrap();
        assert_eq!(everything, summary);
    }

    #[tokio::test]
    async fn search_requires_a_query() {
        let f = fixture();
        assert!(matches!(
            f.service.search_warehouse("  ").await,
            Err(SyncError::Validation(_))
        ));
        let hits = f.service.search_warehouse("mug").await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn api_status_per_side() {
        let f = fixture();
        f.warehouse
            .set_outage(Some(CatalogError::MissingCredential("warehouse access token")));
        let status = f.service.api_status().await;
        assert_eq!(status.warehouse, Connectivity::Offline);
        assert_eq!(status.storefront, Connectivity::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_arms_from_settings_and_rearms() {
        let disabled = fixture();
        let status = disabled.service.start_scheduler_from_settings().await.unwrap();
        assert!(!status.armed);

        let f = fixture_with(SyncSettings::default().with_interval_minutes(5));
        let status = f.service.start_scheduler_from_settings().await.unwrap();
        assert_eq!(status.interval_minutes, Some(5));
        assert!(f.service.scheduler_status().await.armed);

        // Persisting a new interval does not re-arm.
        f.service
            .update_settings(SyncSettings::default().with_interval_minutes(1))
            .await
            .unwrap();
        assert_eq!(f.service.scheduler_status().await.interval_minutes, Some(5));

        let status = f.service.arm_scheduler(1).await;
        assert_eq!(status.interval_minutes, Some(1));

        assert_eq!(f.service.arm_scheduler(0).await, SchedulerStatus::disarmed());
        assert!(!f.service.scheduler_status().await.armed);
    }
}
