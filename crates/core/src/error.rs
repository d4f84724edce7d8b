//! Sync error taxonomy.

use thiserror::Error;

use crate::id::{StorefrontId, WarehouseId};

/// Result type used across the sync engine.
pub type SyncResult<T> = Result<T, SyncError>;

/// Failure of a sync-engine operation.
///
/// Upstream failures (`Warehouse*`, `Storefront*`, `ConfigurationMissing`) are
/// recorded in the sync log by the reconciliation step and never abort a
/// scheduler tick. The remaining variants are surfaced to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Network failure, timeout or non-2xx answer from the warehouse.
    #[error("warehouse unavailable: {0}")]
    WarehouseUnavailable(String),

    /// The warehouse does not know the requested product id.
    #[error("warehouse product not found: {0}")]
    WarehouseNotFound(WarehouseId),

    /// Network failure, timeout or non-2xx answer from the storefront.
    #[error("storefront unavailable: {0}")]
    StorefrontUnavailable(String),

    /// No mapping exists for the storefront id.
    #[error("mapping not found: {0}")]
    MappingNotFound(StorefrontId),

    /// A credential or endpoint setting is absent; no request was sent.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Operator input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The durable store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl SyncError {
    pub fn warehouse_unavailable(msg: impl Into<String>) -> Self {
        Self::WarehouseUnavailable(msg.into())
    }

    pub fn storefront_unavailable(msg: impl Into<String>) -> Self {
        Self::StorefrontUnavailable(msg.into())
    }

    pub fn configuration_missing(msg: impl Into<String>) -> Self {
        Self::ConfigurationMissing(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
