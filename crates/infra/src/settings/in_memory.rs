use std::sync::RwLock;

use super::{SettingsStore, SyncSettings};
use crate::db::StoreError;

#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    inner: RwLock<SyncSettings>,
}

impl InMemorySettingsStore {
    pub fn new(initial: SyncSettings) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }
}

#[async_trait::async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load(&self) -> Result<SyncSettings, StoreError> {
        let settings = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(settings.clone())
    }

    async fn save(&self, settings: &SyncSettings) -> Result<(), StoreError> {
        let mut current = self.inner.write().map_err(|_| StoreError::poisoned())?;
        *current = settings.clone();
        Ok(())
    }
}
