//! Append-only audit trail of reconciliation attempts.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::id::{StorefrontId, SyncLogId, WarehouseId};
use crate::inventory::Quantity;
use crate::mapping::Mapping;

/// Outcome of one reconciliation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }
}

impl core::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for SyncStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(SyncStatus::Success),
            "error" => Ok(SyncStatus::Error),
            other => Err(SyncError::validation(format!(
                "status must be success or error (got {other:?})"
            ))),
        }
    }
}

/// One row of the sync log. Never updated after it is appended.
///
/// Timestamps are kept at microsecond precision so they survive storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: SyncLogId,
    pub storefront_id: StorefrontId,
    pub warehouse_id: WarehouseId,
    pub status: SyncStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl SyncLogEntry {
    pub fn new(
        mapping: &Mapping,
        status: SyncStatus,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SyncLogId::new(),
            storefront_id: mapping.storefront_id.clone(),
            warehouse_id: mapping.warehouse_id.clone(),
            status,
            message: message.into(),
            timestamp: timestamp.trunc_subsecs(6),
        }
    }

    /// Successful push of `quantity` units.
    pub fn success(mapping: &Mapping, quantity: Quantity) -> Self {
        Self::new(
            mapping,
            SyncStatus::Success,
            format!("Updated {quantity} items"),
            Utc::now(),
        )
    }

    /// Failed attempt; the message carries the cause.
    pub fn failure(mapping: &Mapping, cause: &SyncError) -> Self {
        Self::new(mapping, SyncStatus::Error, cause.to_string(), Utc::now())
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }
}

/// Optional filters for listing log entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    pub storefront_id: Option<StorefrontId>,
    pub status: Option<SyncStatus>,
    pub since: Option<DateTime<Utc>>,
}

impl LogFilter {
    pub fn for_storefront(storefront_id: StorefrontId) -> Self {
        Self {
            storefront_id: Some(storefront_id),
            ..Default::default()
        }
    }

    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            ..Default::default()
        }
    }

    pub fn matches(&self, entry: &SyncLogEntry) -> bool {
        self.storefront_id
            .as_ref()
            .is_none_or(|id| *id == entry.storefront_id)
            && self.status.is_none_or(|s| s == entry.status)
            && self.since.is_none_or(|since| entry.timestamp >= since)
    }
}

/// Start of a `days`-long window ending at `now`; saturates at the
/// earliest representable time.
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(days))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Success/error counts for one UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySyncCounts {
    pub date: NaiveDate,
    pub success: usize,
    pub error: usize,
}

impl DailySyncCounts {
    /// Bucket entries newer than `now - days` by UTC day, newest day first.
    pub fn summarize<'a, I>(entries: I, now: DateTime<Utc>, days: u32) -> Vec<Self>
    where
        I: IntoIterator<Item = &'a SyncLogEntry>,
    {
        let since = window_start(now, days);
        let mut buckets: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();

        for entry in entries.into_iter().filter(|e| e.timestamp >= since) {
            let bucket = buckets.entry(entry.timestamp.date_naive()).or_default();
            match entry.status {
                SyncStatus::Success => bucket.0 += 1,
                SyncStatus::Error => bucket.1 += 1,
            }
        }

        buckets
            .into_iter()
            .rev()
            .map(|(date, (success, error))| DailySyncCounts {
                date,
                success,
                error,
            })
            .collect()
    }
}
