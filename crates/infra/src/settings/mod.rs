//! Persisted operator settings: catalog credentials and the scheduler interval.

pub mod in_memory;
pub mod sqlite;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::StoreError;

pub use in_memory::InMemorySettingsStore;
pub use sqlite::SqliteSettingsStore;

const REDACTED: &str = "********";

/// Operator-editable settings, stored as a single record.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Warehouse API access token.
    #[serde(default)]
    pub warehouse_credential: Option<String>,
    /// Storefront API access token.
    #[serde(default)]
    pub storefront_credential: Option<String>,
    /// Scheduler period; 0 disables periodic sync.
    #[serde(default)]
    pub sync_interval_minutes: u32,
}

impl SyncSettings {
    pub fn with_warehouse_credential(mut self, token: impl Into<String>) -> Self {
        self.warehouse_credential = Some(token.into());
        self
    }

    pub fn with_storefront_credential(mut self, token: impl Into<String>) -> Self {
        self.storefront_credential = Some(token.into());
        self
    }

    pub fn with_interval_minutes(mut self, minutes: u32) -> Self {
        self.sync_interval_minutes = minutes;
        self
    }

    /// Copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            warehouse_credential: self.warehouse_credential.as_ref().map(|_| REDACTED.to_string()),
            storefront_credential: self.storefront_credential.as_ref().map(|_| REDACTED.to_string()),
            sync_interval_minutes: self.sync_interval_minutes,
        }
    }
}

impl core::fmt::Debug for SyncSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let masked = self.redacted();
        f.debug_struct("SyncSettings")
            .field("warehouse_credential", &masked.warehouse_credential)
            .field("storefront_credential", &masked.storefront_credential)
            .field("sync_interval_minutes", &self.sync_interval_minutes)
            .finish()
    }
}

#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current settings, or defaults if none were ever saved.
    async fn load(&self) -> Result<SyncSettings, StoreError>;

    async fn save(&self, settings: &SyncSettings) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> SettingsStore for Arc<S>
where
    S: SettingsStore + ?Sized,
{
    async fn load(&self) -> Result<SyncSettings, StoreError> {
        (**self).load().await
    }

    async fn save(&self, settings: &SyncSettings) -> Result<(), StoreError> {
        (**self).save(settings).await
    }
}
