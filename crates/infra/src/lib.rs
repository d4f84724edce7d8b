//! Infrastructure layer: stores, inventory cache, catalog adapters,
//! reconciliation and scheduling.

pub mod cache;
pub mod config;
pub mod db;
pub mod external;
pub mod mapping_store;
pub mod reader;
pub mod reconcile;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod sync_log;
pub mod writer;

pub use service::{ApiStatus, Connectivity, SchedulerStatus, SyncService, SyncServiceBuilder};
