//! Reconciliation Unit: fetch from the warehouse, push to the storefront,
//! record the outcome.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use stockbridge_core::{Mapping, Quantity, SyncError, SyncLogEntry};

use crate::reader::WarehouseInventoryReader;
use crate::sync_log::SyncLogStore;
use crate::writer::StorefrontInventoryWriter;

#[derive(Clone)]
pub struct Reconciler {
    reader: WarehouseInventoryReader,
    writer: StorefrontInventoryWriter,
    log: Arc<dyn SyncLogStore>,
}

impl Reconciler {
    pub fn new(
        reader: WarehouseInventoryReader,
        writer: StorefrontInventoryWriter,
        log: Arc<dyn SyncLogStore>,
    ) -> Self {
        Self { reader, writer, log }
    }

    pub fn reader(&self) -> &WarehouseInventoryReader {
        &self.reader
    }

    /// Run one fetch-then-push for `mapping` and append exactly one log entry.
    ///
    /// Catalog failures become an `error` entry; they are never returned. A
    /// failed fetch skips the push.
    #[instrument(
        skip(self, mapping),
        fields(storefront_id = %mapping.storefront_id, warehouse_id = %mapping.warehouse_id)
    )]
    pub async fn reconcile(&self, mapping: &Mapping) -> SyncLogEntry {
        let entry = match self.transfer(mapping).await {
            Ok(quantity) => {
                info!(quantity, "stock synced");
                SyncLogEntry::success(mapping, quantity)
            }
            Err(err) => {
                warn!(error = %err, "stock sync failed");
                SyncLogEntry::failure(mapping, &err)
            }
        };

        // The entry is still returned to the caller if the log write fails.
        if let Err(e) = self.log.append(entry.clone()).await {
            error!(error = %e, "failed to append sync log entry");
        }
        entry
    }

    async fn transfer(&self, mapping: &Mapping) -> Result<Quantity, SyncError> {
        let quantity = self.reader.fetch(&mapping.warehouse_id).await?;
        self.writer.push(&mapping.location_id(), quantity).await?;
        Ok(quantity)
    }
}
