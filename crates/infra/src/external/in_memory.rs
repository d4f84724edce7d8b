//! In-memory catalogs with call counters and failure injection.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use stockbridge_core::{
    LocationId, Quantity, StorefrontId, WarehouseId, WarehouseProduct, WarehouseStock,
};

use super::{CatalogError, StorefrontCatalog, WarehouseCatalog};

#[derive(Debug, Default)]
pub struct InMemoryWarehouse {
    stock: RwLock<HashMap<WarehouseId, WarehouseStock>>,
    products: RwLock<Vec<WarehouseProduct>>,
    failures: RwLock<HashMap<WarehouseId, CatalogError>>,
    outage: RwLock<Option<CatalogError>>,
    latency: Option<Duration>,
    lookups: AtomicUsize,
}

impl InMemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(self, id: impl Into<WarehouseId>, stock: WarehouseStock) -> Self {
        self.set_stock(id, stock);
        self
    }

    /// Make every lookup take `latency` (a `tokio` sleep).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_product(self, product: WarehouseProduct) -> Self {
        if let Ok(mut products) = self.products.write() {
            products.push(product);
        }
        self
    }

    pub fn set_stock(&self, id: impl Into<WarehouseId>, stock: WarehouseStock) {
        if let Ok(mut map) = self.stock.write() {
            map.insert(id.into(), stock);
        }
    }

    /// Make lookups of one id fail.
    pub fn fail_lookup(&self, id: impl Into<WarehouseId>, error: CatalogError) {
        if let Ok(mut map) = self.failures.write() {
            map.insert(id.into(), error);
        }
    }

    /// Make every call fail until cleared with `None`.
    pub fn set_outage(&self, error: Option<CatalogError>) {
        if let Ok(mut outage) = self.outage.write() {
            *outage = error;
        }
    }

    /// Lookups attempted so far, failed ones included.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn outage(&self) -> Result<(), CatalogError> {
        match self.outage.read().ok().and_then(|o| o.clone()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl WarehouseCatalog for InMemoryWarehouse {
    async fn lookup_by_id(&self, id: &WarehouseId) -> Result<WarehouseStock, CatalogError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.outage()?;
        if let Some(err) = self.failures.read().ok().and_then(|f| f.get(id).cloned()) {
            return Err(err);
        }
        self.stock
            .read()
            .ok()
            .and_then(|s| s.get(id).cloned())
            .ok_or(CatalogError::NotFound)
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<WarehouseProduct>, CatalogError> {
        self.outage()?;
        let needle = query.to_lowercase();
        let products = self.products.read().map(|p| p.clone()).unwrap_or_default();
        Ok(products
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect())
    }

    async fn check_status(&self) -> Result<(), CatalogError> {
        self.outage()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStorefront {
    levels: RwLock<HashMap<LocationId, Quantity>>,
    pushes: RwLock<Vec<(LocationId, Quantity)>>,
    products: RwLock<Vec<StorefrontId>>,
    outage: RwLock<Option<CatalogError>>,
}

impl InMemoryStorefront {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StorefrontId>,
    {
        if let Ok(mut products) = self.products.write() {
            products.extend(ids.into_iter().map(Into::into));
        }
        self
    }

    pub fn set_outage(&self, error: Option<CatalogError>) {
        if let Ok(mut outage) = self.outage.write() {
            *outage = error;
        }
    }

    /// Current level at `location`, if ever set.
    pub fn level(&self, location: &LocationId) -> Option<Quantity> {
        self.levels.read().ok()?.get(location).copied()
    }

    /// Successful pushes in call order.
    pub fn pushes(&self) -> Vec<(LocationId, Quantity)> {
        self.pushes.read().map(|p| p.clone()).unwrap_or_default()
    }

    fn outage(&self) -> Result<(), CatalogError> {
        match self.outage.read().ok().and_then(|o| o.clone()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl StorefrontCatalog for InMemoryStorefront {
    async fn set_inventory_level(
        &self,
        location: &LocationId,
        quantity: Quantity,
    ) -> Result<(), CatalogError> {
        self.outage()?;
        if let Ok(mut levels) = self.levels.write() {
            levels.insert(location.clone(), quantity);
        }
        if let Ok(mut pushes) = self.pushes.write() {
            pushes.push((location.clone(), quantity));
        }
        Ok(())
    }

    async fn list_product_ids(&self) -> Result<Vec<StorefrontId>, CatalogError> {
        self.outage()?;
        Ok(self.products.read().map(|p| p.clone()).unwrap_or_default())
    }

    async fn check_status(&self) -> Result<(), CatalogError> {
        self.outage()
    }
}
