//! External catalog capabilities consumed by the sync engine.
//!
//! The engine only sees the [`WarehouseCatalog`] and [`StorefrontCatalog`]
//! traits. HTTP adapters live next to in-memory fakes used by tests and
//! local runs.

pub mod in_memory;
pub mod storefront_http;
pub mod warehouse_http;

use std::sync::Arc;

use stockbridge_core::{
    LocationId, Quantity, StorefrontId, SyncError, WarehouseId, WarehouseProduct, WarehouseStock,
};

pub use in_memory::{InMemoryStorefront, InMemoryWarehouse};
pub use storefront_http::HttpStorefrontCatalog;
pub use warehouse_http::HttpWarehouseCatalog;

/// Failure of a single catalog call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// A credential or endpoint parameter is unset; nothing was sent.
    #[error("{0} is not configured")]
    MissingCredential(&'static str),
    /// Credentials could not be read from the settings store.
    #[error("could not load credentials: {0}")]
    Credentials(String),
    #[error("product not found")]
    NotFound,
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// A 2xx answer whose payload reports failure.
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            CatalogError::Timeout
        } else if value.is_decode() {
            CatalogError::Malformed(value.to_string())
        } else {
            CatalogError::Transport(value.to_string())
        }
    }
}

impl CatalogError {
    /// Classify a failed warehouse lookup of `id`.
    pub fn into_warehouse_error(self, id: &WarehouseId) -> SyncError {
        match self {
            CatalogError::NotFound => SyncError::WarehouseNotFound(id.clone()),
            other => other.into_warehouse_unavailable(),
        }
    }

    /// Classify a failed warehouse call that is not about one product.
    pub fn into_warehouse_unavailable(self) -> SyncError {
        match self {
            CatalogError::MissingCredential(_) | CatalogError::Credentials(_) => {
                SyncError::configuration_missing(self.to_string())
            }
            other => SyncError::warehouse_unavailable(other.to_string()),
        }
    }

    /// Classify a failed storefront call. There is no "not found" for a push.
    pub fn into_storefront_error(self) -> SyncError {
        match self {
            CatalogError::MissingCredential(_) | CatalogError::Credentials(_) => {
                SyncError::configuration_missing(self.to_string())
            }
            other => SyncError::storefront_unavailable(other.to_string()),
        }
    }
}

/// Read side: the warehouse is the source of truth for quantity.
#[async_trait::async_trait]
pub trait WarehouseCatalog: Send + Sync {
    /// Stock fields for one product.
    async fn lookup_by_id(&self, id: &WarehouseId) -> Result<WarehouseStock, CatalogError>;

    /// Pass-through search used when an operator links products.
    async fn search_by_name(&self, query: &str) -> Result<Vec<WarehouseProduct>, CatalogError>;

    /// Cheap authenticated reachability check.
    async fn check_status(&self) -> Result<(), CatalogError>;
}

/// Write side: absolute inventory levels, never deltas.
#[async_trait::async_trait]
pub trait StorefrontCatalog: Send + Sync {
    async fn set_inventory_level(
        &self,
        location: &LocationId,
        quantity: Quantity,
    ) -> Result<(), CatalogError>;

    /// Every product id the storefront knows, across all result pages.
    async fn list_product_ids(&self) -> Result<Vec<StorefrontId>, CatalogError>;

    async fn check_status(&self) -> Result<(), CatalogError>;
}

#[async_trait::async_trait]
impl<C> WarehouseCatalog for Arc<C>
where
    C: WarehouseCatalog + ?Sized,
{
    async fn lookup_by_id(&self, id: &WarehouseId) -> Result<WarehouseStock, CatalogError> {
        (**self).lookup_by_id(id).await
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<WarehouseProduct>, CatalogError> {
        (**self).search_by_name(query).await
    }

    async fn check_status(&self) -> Result<(), CatalogError> {
        (**self).check_status().await
    }
}

#[async_trait::async_trait]
impl<C> StorefrontCatalog for Arc<C>
where
    C: StorefrontCatalog + ?Sized,
{
    async fn set_inventory_level(
        &self,
        location: &LocationId,
        quantity: Quantity,
    ) -> Result<(), CatalogError> {
        (**self).set_inventory_level(location, quantity).await
    }

    async fn list_product_ids(&self) -> Result<Vec<StorefrontId>, CatalogError> {
        (**self).list_product_ids().await
    }

    async fn check_status(&self) -> Result<(), CatalogError> {
        (**self).check_status().await
    }
}

/// Build a client whose every request is bounded by `timeout`.
pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, CatalogError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(CatalogError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warehouse_classification() {
        let id = WarehouseId::new("W1");
        assert_eq!(
            CatalogError::NotFound.into_warehouse_error(&id),
            SyncError::WarehouseNotFound(id.clone())
        );
        assert!(matches!(
            CatalogError::MissingCredential("warehouse access token").into_warehouse_error(&id),
            SyncError::ConfigurationMissing(msg) if msg.contains("warehouse access token")
        ));
        assert!(matches!(
            CatalogError::Timeout.into_warehouse_error(&id),
            SyncError::WarehouseUnavailable(msg) if msg.contains("timed out")
        ));
    }

    #[test]
    fn storefront_classification() {
        assert!(matches!(
            CatalogError::Status { status: 503, body: "down".into() }.into_storefront_error(),
            SyncError::StorefrontUnavailable(msg) if msg.contains("503")
        ));
        assert!(matches!(
            CatalogError::NotFound.into_storefront_error(),
            SyncError::StorefrontUnavailable(_)
        ));
    }
}
