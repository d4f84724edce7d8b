use std::collections::HashMap;
use std::sync::RwLock;

use stockbridge_core::{Mapping, StorefrontId};

use super::MappingStore;
use crate::db::StoreError;

/// In-memory mapping store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMappingStore {
    inner: RwLock<HashMap<StorefrontId, Mapping>>,
}

impl InMemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MappingStore for InMemoryMappingStore {
    async fn upsert(&self, mapping: Mapping) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        map.insert(mapping.storefront_id.clone(), mapping);
        Ok(())
    }

    async fn upsert_many(&self, mappings: Vec<Mapping>) -> Result<(), StoreError> {
        // One write guard for the whole batch: readers see all or none of it.
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        for mapping in mappings {
            map.insert(mapping.storefront_id.clone(), mapping);
        }
        Ok(())
    }

    async fn remove(&self, storefront_id: &StorefrontId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        Ok(map.remove(storefront_id).is_some())
    }

    async fn get(&self, storefront_id: &StorefrontId) -> Result<Option<Mapping>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.get(storefront_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Mapping>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.values().cloned().collect())
    }
}
