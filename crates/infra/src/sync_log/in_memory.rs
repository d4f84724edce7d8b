use std::sync::RwLock;

use chrono::{DateTime, Utc};
use stockbridge_core::{LogFilter, Page, Pagination, StorefrontId, SyncLogEntry};

use super::SyncLogStore;
use crate::db::StoreError;

/// In-memory sync log for tests/dev. Keeps entries in insertion order.
#[derive(Debug, Default)]
pub struct InMemorySyncLogStore {
    entries: RwLock<Vec<SyncLogEntry>>,
}

impl InMemorySyncLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matching entries, newest first.
    fn matching(&self, filter: &LogFilter) -> Result<Vec<SyncLogEntry>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::poisoned())?;
        // Reverse first, then a stable sort keeps later inserts ahead on ties.
        let mut out: Vec<SyncLogEntry> = entries
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(out)
    }
}

#[async_trait::async_trait]
impl SyncLogStore for InMemorySyncLogStore {
    async fn append(&self, entry: SyncLogEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::poisoned())?;
        entries.push(entry);
        Ok(())
    }

    async fn query(
        &self,
        filter: &LogFilter,
        pagination: Pagination,
    ) -> Result<Page<SyncLogEntry>, StoreError> {
        Ok(Page::paginate(self.matching(filter)?, pagination))
    }

    async fn latest_for(
        &self,
        storefront_id: &StorefrontId,
    ) -> Result<Option<SyncLogEntry>, StoreError> {
        let filter = LogFilter::for_storefront(storefront_id.clone());
        Ok(self.matching(&filter)?.into_iter().next())
    }

    async fn delete_for(&self, storefront_id: &StorefrontId) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::poisoned())?;
        let before = entries.len();
        entries.retain(|e| e.storefront_id != *storefront_id);
        Ok((before - entries.len()) as u64)
    }

    async fn since(&self, since: DateTime<Utc>) -> Result<Vec<SyncLogEntry>, StoreError> {
        self.matching(&LogFilter::since(since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stockbridge_core::{Mapping, SyncStatus};

    fn entry(storefront: &str, minute: u32, status: SyncStatus) -> SyncLogEntry {
        SyncLogEntry::new(
            &Mapping::new(storefront, "W1", "mug"),
            status,
            format!("m{minute}"),
            Utc.with_ymd_and_hms(2026, 5, 1, 12, minute, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn query_is_newest_first_with_full_total() {
        let log = InMemorySyncLogStore::new();
        for minute in [3, 1, 2, 5, 4] {
            log.append(entry("S1", minute, SyncStatus::Success)).await.unwrap();
        }

        let page = log.query(&LogFilter::default(), Pagination::new(1, 2)).await.unwrap();
        assert_eq!(page.total, 5);
        let messages: Vec<_> = page.items.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["m5", "m4"]);
    }

    #[tokio::test]
    async fn latest_for_breaks_ties_by_insertion() {
        let log = InMemorySyncLogStore::new();
        log.append(entry("S1", 1, SyncStatus::Success)).await.unwrap();
        let mut second = entry("S1", 1, SyncStatus::Error);
        second.message = "later".into();
        log.append(second).await.unwrap();
        log.append(entry("S2", 9, SyncStatus::Success)).await.unwrap();

        let latest = log.latest_for(&StorefrontId::new("S1")).await.unwrap().unwrap();
        assert_eq!(latest.message, "later");
        assert_eq!(latest.status, SyncStatus::Error);
    }

    #[tokio::test]
    async fn delete_for_only_touches_one_storefront_id() {
        let log = InMemorySyncLogStore::new();
        log.append(entry("S1", 1, SyncStatus::Success)).await.unwrap();
        log.append(entry("S1", 2, SyncStatus::Error)).await.unwrap();
        log.append(entry("S2", 3, SyncStatus::Success)).await.unwrap();

        assert_eq!(log.delete_for(&StorefrontId::new("S1")).await.unwrap(), 2);
        assert_eq!(log.delete_for(&StorefrontId::new("S1")).await.unwrap(), 0);
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn status_filter_applies_before_paging() {
        let log = InMemorySyncLogStore::new();
        for minute in 0..6 {
            let status = if minute % 2 == 0 { SyncStatus::Error } else { SyncStatus::Success };
            log.append(entry("S1", minute, status)).await.unwrap();
        }
        let filter = LogFilter {
            status: Some(SyncStatus::Error),
            ..Default::default()
        };
        let page = log.query(&filter, Pagination::new(2, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].message, "m0");
    }
}
