//! Mapping Store: durable storefront → warehouse product bindings.

pub mod in_memory;
pub mod sqlite;

use std::sync::Arc;

use stockbridge_core::{Mapping, StorefrontId};

use crate::db::StoreError;

pub use in_memory::InMemoryMappingStore;
pub use sqlite::SqliteMappingStore;

/// Keyed by storefront id; every write replaces a whole record atomically.
#[async_trait::async_trait]
pub trait MappingStore: Send + Sync {
    /// Create or replace the binding for `mapping.storefront_id`.
    async fn upsert(&self, mapping: Mapping) -> Result<(), StoreError>;

    /// Upsert a batch all-or-nothing.
    async fn upsert_many(&self, mappings: Vec<Mapping>) -> Result<(), StoreError>;

    /// Remove the binding. Returns whether one existed; absent ids are not an error.
    async fn remove(&self, storefront_id: &StorefrontId) -> Result<bool, StoreError>;

    async fn get(&self, storefront_id: &StorefrontId) -> Result<Option<Mapping>, StoreError>;

    /// All current bindings, in no particular order.
    async fn list(&self) -> Result<Vec<Mapping>, StoreError>;
}

#[async_trait::async_trait]
impl<S> MappingStore for Arc<S>
where
    S: MappingStore + ?Sized,
{
    async fn upsert(&self, mapping: Mapping) -> Result<(), StoreError> {
        (**self).upsert(mapping).await
    }

    async fn upsert_many(&self, mappings: Vec<Mapping>) -> Result<(), StoreError> {
        (**self).upsert_many(mappings).await
    }

    async fn remove(&self, storefront_id: &StorefrontId) -> Result<bool, StoreError> {
        (**self).remove(storefront_id).await
    }

    async fn get(&self, storefront_id: &StorefrontId) -> Result<Option<Mapping>, StoreError> {
        (**self).get(storefront_id).await
    }

    async fn list(&self) -> Result<Vec<Mapping>, StoreError> {
        (**self).list().await
    }
}
