//! `stockbridge-core`: domain building blocks for catalog stock reconciliation.
//!
//! This crate contains **pure domain** types and rules (no I/O, no runtime).

pub mod error;
pub mod id;
pub mod inventory;
pub mod mapping;
pub mod pagination;
pub mod sync_log;

pub use error::{SyncError, SyncResult};
pub use id::{LocationId, StorefrontId, SyncLogId, WarehouseId};
pub use inventory::{
    LocationStock, Quantity, QuantityExtractor, QuantitySource, WarehouseProduct, WarehouseStock,
};
pub use mapping::{Mapping, MappingStats, ProductFilter};
pub use pagination::{Page, Pagination};
pub use sync_log::{DailySyncCounts, LogFilter, SyncLogEntry, SyncStatus, window_start};
