//! Warehouse Inventory Reader: cache-first quantity reads.

use std::sync::Arc;

use tracing::{debug, instrument};

use stockbridge_core::{Quantity, QuantityExtractor, SyncResult, WarehouseId, WarehouseStock};

use crate::cache::InventoryCache;
use crate::external::WarehouseCatalog;

#[derive(Clone)]
pub struct WarehouseInventoryReader {
    catalog: Arc<dyn WarehouseCatalog>,
    cache: Arc<InventoryCache>,
    extractor: QuantityExtractor,
}

impl WarehouseInventoryReader {
    pub fn new(catalog: Arc<dyn WarehouseCatalog>, cache: Arc<InventoryCache>) -> Self {
        Self {
            catalog,
            cache,
            extractor: QuantityExtractor::default(),
        }
    }

    /// Prefer the `available` figure of one warehouse location.
    pub fn with_location(mut self, location: Option<&str>) -> Self {
        self.extractor = QuantityExtractor::for_location(location);
        self
    }

    pub fn cache(&self) -> &Arc<InventoryCache> {
        &self.cache
    }

    /// Stock snapshot for `id`, from the cache when warm.
    pub async fn stock(&self, id: &WarehouseId) -> SyncResult<WarehouseStock> {
        self.cache
            .get_or_try_fetch(id, || async {
                debug!(warehouse_id = %id, "inventory cache miss");
                self.catalog
                    .lookup_by_id(id)
                    .await
                    .map_err(|e| e.into_warehouse_error(id))
            })
            .await
    }

    #[instrument(skip(self, id), fields(warehouse_id = %id))]
    pub async fn fetch(&self, id: &WarehouseId) -> SyncResult<Quantity> {
        let stock = self.stock(id).await?;
        Ok(self.extractor.extract(&stock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{CatalogError, InMemoryWarehouse};
    use std::time::Duration;
    use stockbridge_core::SyncError;

    fn reader(warehouse: Arc<InMemoryWarehouse>, ttl: Duration) -> WarehouseInventoryReader {
        WarehouseInventoryReader::new(warehouse, Arc::new(InventoryCache::new(ttl)))
    }

    #[tokio::test]
    async fn warm_cache_skips_the_warehouse() {
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let reader = reader(warehouse.clone(), Duration::from_secs(300));
        reader
            .cache()
            .put(WarehouseId::new("W1"), WarehouseStock::with_remain(7));

        assert_eq!(reader.fetch(&WarehouseId::new("W1")).await.unwrap(), 7);
        assert_eq!(warehouse.lookup_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn one_lookup_per_ttl_window() {
        let warehouse = Arc::new(
            InMemoryWarehouse::new().with_stock("W1", WarehouseStock::with_remain(42)),
        );
        let reader = reader(warehouse.clone(), Duration::from_secs(300));
        let id = WarehouseId::new("W1");

        assert_eq!(reader.fetch(&id).await.unwrap(), 42);
        warehouse.set_stock("W1", WarehouseStock::with_remain(40));
        assert_eq!(reader.fetch(&id).await.unwrap(), 42);
        assert_eq!(warehouse.lookup_count(), 1);

        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(reader.fetch(&id).await.unwrap(), 40);
        assert_eq!(warehouse.lookup_count(), 2);
    }

    #[tokio::test]
    async fn location_figure_survives_a_cache_hit() {
        let warehouse = Arc::new(InMemoryWarehouse::new().with_stock(
            "W1",
            WarehouseStock::with_remain(100).with_location("175080", 12),
        ));
        let by_depot = reader(warehouse.clone(), Duration::from_secs(300)).with_location(Some("175080"));
        let id = WarehouseId::new("W1");

        assert_eq!(by_depot.fetch(&id).await.unwrap(), 12);
        assert_eq!(by_depot.fetch(&id).await.unwrap(), 12);
        assert_eq!(warehouse.lookup_count(), 1);
    }

    #[tokio::test]
    async fn failures_are_classified_and_not_cached() {
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let reader = reader(warehouse.clone(), Duration::from_secs(300));
        let id = WarehouseId::new("W9");

        assert_eq!(
            reader.fetch(&id).await.unwrap_err(),
            SyncError::WarehouseNotFound(id.clone())
        );

        warehouse.fail_lookup("W9", CatalogError::Timeout);
        assert!(matches!(
            reader.fetch(&id).await.unwrap_err(),
            SyncError::WarehouseUnavailable(_)
        ));
        assert!(reader.cache().is_empty());
        assert_eq!(warehouse.lookup_count(), 2);
    }
}
