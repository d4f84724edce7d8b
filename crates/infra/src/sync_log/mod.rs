//! Sync Log: append-only audit trail of reconciliation attempts.

pub mod in_memory;
pub mod sqlite;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use stockbridge_core::{LogFilter, Page, Pagination, StorefrontId, SyncLogEntry};

use crate::db::StoreError;

pub use in_memory::InMemorySyncLogStore;
pub use sqlite::SqliteSyncLogStore;

/// Entries are never updated; deletion happens only in bulk per storefront id.
///
/// Listings are ordered newest first. Entries with equal timestamps come out
/// in reverse insertion order.
#[async_trait::async_trait]
pub trait SyncLogStore: Send + Sync {
    async fn append(&self, entry: SyncLogEntry) -> Result<(), StoreError>;

    /// One page of matching entries; `total` counts every match.
    async fn query(
        &self,
        filter: &LogFilter,
        pagination: Pagination,
    ) -> Result<Page<SyncLogEntry>, StoreError>;

    /// Most recent entry for a storefront id (its current status).
    async fn latest_for(
        &self,
        storefront_id: &StorefrontId,
    ) -> Result<Option<SyncLogEntry>, StoreError>;

    /// Delete every entry for a storefront id and return how many went.
    async fn delete_for(&self, storefront_id: &StorefrontId) -> Result<u64, StoreError>;

    /// All entries at or after `since`, newest first.
    async fn since(&self, since: DateTime<Utc>) -> Result<Vec<SyncLogEntry>, StoreError>;
}

#[async_trait::async_trait]
impl<S> SyncLogStore for Arc<S>
where
    S: SyncLogStore + ?Sized,
{
    async fn append(&self, entry: SyncLogEntry) -> Result<(), StoreError> {
        (**self).append(entry).await
    }

    async fn query(
        &self,
        filter: &LogFilter,
        pagination: Pagination,
    ) -> Result<Page<SyncLogEntry>, StoreError> {
        (**self).query(filter, pagination).await
    }

    async fn latest_for(
        &self,
        storefront_id: &StorefrontId,
    ) -> Result<Option<SyncLogEntry>, StoreError> {
        (**self).latest_for(storefront_id).await
    }

    async fn delete_for(&self, storefront_id: &StorefrontId) -> Result<u64, StoreError> {
        (**self).delete_for(storefront_id).await
    }

    async fn since(&self, since: DateTime<Utc>) -> Result<Vec<SyncLogEntry>, StoreError> {
        (**self).since(since).await
    }
}
