//! Storefront Inventory Writer.

use std::sync::Arc;

use tracing::instrument;

use stockbridge_core::{LocationId, Quantity, SyncResult};

use crate::external::StorefrontCatalog;

#[derive(Clone)]
pub struct StorefrontInventoryWriter {
    catalog: Arc<dyn StorefrontCatalog>,
}

impl StorefrontInventoryWriter {
    pub fn new(catalog: Arc<dyn StorefrontCatalog>) -> Self {
        Self { catalog }
    }

    /// Overwrite the level at `location` with exactly `quantity`.
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn push(&self, location: &LocationId, quantity: Quantity) -> SyncResult<()> {
        self.catalog
            .set_inventory_level(location, quantity)
            .await
            .map_err(|e| e.into_storefront_error())
    }
}
