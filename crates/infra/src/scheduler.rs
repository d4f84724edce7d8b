//! Scheduler: periodic driver that reconciles every mapping once per tick.
//!
//! The scheduler is either disabled or armed with an interval. Arming
//! returns a [`SchedulerHandle`] that owns the background task; dropping or
//! shutting down the handle stops future ticks. A tick already in progress
//! is allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Semaphore, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use stockbridge_core::SyncStatus;

use crate::db::StoreError;
use crate::mapping_store::MappingStore;
use crate::reconcile::Reconciler;

/// Tick settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Reconciliations allowed in flight at once within a tick.
    pub max_concurrent: usize,
}

impl SchedulerConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_concurrent: 4,
        }
    }

    /// `None` for 0 minutes: the scheduler stays disabled.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes > 0).then(|| Self::new(Duration::from_secs(u64::from(minutes) * 60)))
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }
}

/// Outcome counts of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Scheduler {
    mappings: Arc<dyn MappingStore>,
    reconciler: Reconciler,
}

impl Scheduler {
    pub fn new(mappings: Arc<dyn MappingStore>, reconciler: Reconciler) -> Self {
        Self {
            mappings,
            reconciler,
        }
    }

    /// Reconcile every current mapping, at most `max_concurrent` at a time.
    ///
    /// One mapping's failure never stops the others. Only a failure to list
    /// the mappings is returned as an error.
    pub async fn run_tick(&self, max_concurrent: usize) -> Result<TickReport, StoreError> {
        let mappings = self.mappings.list().await?;
        let permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut tasks = JoinSet::new();
        let mut report = TickReport {
            total: mappings.len(),
            ..Default::default()
        };

        for mapping in mappings {
            let permits = permits.clone();
            let reconciler = self.reconciler.clone();
            tasks.spawn(async move {
                // The semaphore is never closed, so acquire only fails if it were.
                let _permit = permits.acquire_owned().await.ok();
                reconciler.reconcile(&mapping).await.status
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(SyncStatus::Success) => report.succeeded += 1,
                Ok(SyncStatus::Error) => report.failed += 1,
                Err(e) => {
                    warn!(error = %e, "reconciliation task aborted");
                    report.failed += 1;
                }
            }
        }

        debug!(?report, "tick finished");
        Ok(report)
    }

    /// Start ticking every `config.interval`; the first tick fires one
    /// interval after arming.
    pub fn arm(&self, config: SchedulerConfig) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let scheduler = self.clone();

        let join = tokio::spawn(async move {
            info!(interval_secs = config.interval.as_secs(), "scheduler armed");
            let mut ticker =
                tokio::time::interval_at(Instant::now() + config.interval, config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    // Fires on an explicit shutdown and when the handle is dropped.
                    _ = &mut shutdown_rx => {
                        info!("scheduler disarmed");
                        break;
                    }
                    _ = ticker.tick() => {
                        match scheduler.run_tick(config.max_concurrent).await {
                            Ok(report) => info!(
                                total = report.total,
                                succeeded = report.succeeded,
                                failed = report.failed,
                                "scheduled sync tick"
                            ),
                            Err(e) => warn!(error = %e, "scheduled sync tick could not list mappings"),
                        }
                    }
                }
            }
        });

        SchedulerHandle {
            config,
            shutdown: Some(shutdown_tx),
            join: Some(join),
        }
    }
}

/// Owned handle to an armed scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    config: SchedulerConfig,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }

    /// Stop ticking and wait for a tick in progress to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                warn!(error = %e, "scheduler task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InventoryCache;
    use crate::external::{InMemoryStorefront, InMemoryWarehouse};
    use crate::mapping_store::InMemoryMappingStore;
    use crate::reader::WarehouseInventoryReader;
    use crate::sync_log::{InMemorySyncLogStore, SyncLogStore};
    use crate::writer::StorefrontInventoryWriter;
    use stockbridge_core::{Mapping, StorefrontId, WarehouseStock};

    struct Fixture {
        mappings: Arc<InMemoryMappingStore>,
        warehouse: Arc<InMemoryWarehouse>,
        log: Arc<InMemorySyncLogStore>,
        scheduler: Scheduler,
    }

    fn fixture() -> Fixture {
        let mappings = Arc::new(InMemoryMappingStore::new());
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let storefront = Arc::new(InMemoryStorefront::new());
        let log = Arc::new(InMemorySyncLogStore::new());
        let reconciler = Reconciler::new(
            WarehouseInventoryReader::new(warehouse.clone(), Arc::new(InventoryCache::default())),
            StorefrontInventoryWriter::new(storefront),
            log.clone(),
        );
        Fixture {
            scheduler: Scheduler::new(mappings.clone(), reconciler),
            mappings,
            warehouse,
            log,
        }
    }

    #[test]
    fn zero_minutes_is_disabled() {
        assert_eq!(SchedulerConfig::from_minutes(0), None);
        let config = SchedulerConfig::from_minutes(2).unwrap().with_max_concurrent(0);
        assert_eq!(config.interval, Duration::from_secs(120));
        assert_eq!(config.max_concurrent, 1);
    }

    #[tokio::test]
    async fn failing_mapping_does_not_stop_the_tick() {
        let f = fixture();
        f.warehouse.set_stock("WB", WarehouseStock::with_remain(3));
        f.mappings.upsert(Mapping::new("A", "W-missing", "a")).await.unwrap();
        f.mappings.upsert(Mapping::new("B", "WB", "b")).await.unwrap();

        let report = f.scheduler.run_tick(2).await.unwrap();
        assert_eq!(
            report,
            TickReport {
                total: 2,
                succeeded: 1,
                failed: 1
            }
        );

        let b = f.log.latest_for(&StorefrontId::new("B")).await.unwrap().unwrap();
        assert!(b.is_success());
        let a = f.log.latest_for(&StorefrontId::new("A")).await.unwrap().unwrap();
        assert!(!a.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn bundled_mappings_share_one_warehouse_lookup() {
        let mappings = Arc::new(InMemoryMappingStore::new());
        let warehouse = Arc::new(
            InMemoryWarehouse::new()
                .with_stock("W1", WarehouseStock::with_remain(6))
                .with_latency(Duration::from_millis(50)),
        );
        let storefront = Arc::new(InMemoryStorefront::new());
        let reconciler = Reconciler::new(
            WarehouseInventoryReader::new(warehouse.clone(), Arc::new(InventoryCache::default())),
            StorefrontInventoryWriter::new(storefront.clone()),
            Arc::new(InMemorySyncLogStore::new()),
        );
        mappings.upsert(Mapping::new("S1", "W1", "mug")).await.unwrap();
        mappings.upsert(Mapping::new("S2", "W1", "mug, gift box")).await.unwrap();

        let report = Scheduler::new(mappings, reconciler).run_tick(4).await.unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(warehouse.lookup_count(), 1);
        assert_eq!(storefront.pushes().len(), 2);
    }

    #[tokio::test]
    async fn empty_store_is_an_empty_tick() {
        let f = fixture();
        assert_eq!(f.scheduler.run_tick(4).await.unwrap(), TickReport::default());
    }

    #[tokio::test(start_paused = true)]
    async fn armed_scheduler_ticks_until_shut_down() {
        let f = fixture();
        f.warehouse.set_stock("W1", WarehouseStock::with_remain(1));
        f.mappings.upsert(Mapping::new("S1", "W1", "mug")).await.unwrap();

        let handle = f.scheduler.arm(SchedulerConfig::new(Duration::from_secs(60)));
        assert!(handle.is_running());
        assert_eq!(handle.interval(), Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(f.log.len(), 0, "first tick waits one interval");

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(f.log.len(), 2);

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(f.log.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_disarms() {
        let f = fixture();
        f.mappings.upsert(Mapping::new("S1", "W1", "mug")).await.unwrap();

        drop(f.scheduler.arm(SchedulerConfig::new(Duration::from_secs(60))));
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(f.log.is_empty());
    }
}
