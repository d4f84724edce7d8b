use serde::{Deserialize, Serialize};

use stockbridge_core::{
    LocationId, LogFilter, Mapping, Pagination, ProductFilter, StorefrontId, SyncResult, SyncStatus,
    WarehouseId,
};
use stockbridge_infra::settings::SyncSettings;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct MappingRequest {
    pub storefront_id: String,
    pub warehouse_id: String,
    #[serde(default)]
    pub warehouse_name: String,
    #[serde(default)]
    pub inventory_location_id: Option<String>,
}

impl MappingRequest {
    /// Ids are trimmed; blank ids are rejected.
    pub fn into_mapping(self) -> SyncResult<Mapping> {
        let storefront_id: StorefrontId = self.storefront_id.parse()?;
        let warehouse_id: WarehouseId = self.warehouse_id.parse()?;
        let mut mapping = Mapping::new(storefront_id, warehouse_id, self.warehouse_name);
        if let Some(location) = self.inventory_location_id {
            mapping = mapping.with_location(location.parse::<LocationId>()?);
        }
        Ok(mapping)
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveMappingsRequest {
    pub mappings: Vec<MappingRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub storefront_id: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl LogsQuery {
    pub fn filter(&self) -> SyncResult<LogFilter> {
        Ok(LogFilter {
            storefront_id: self
                .storefront_id
                .as_deref()
                .map(str::parse::<StorefrontId>)
                .transpose()?,
            status: self
                .status
                .as_deref()
                .map(str::parse::<SyncStatus>)
                .transpose()?,
            since: None,
        })
    }

    pub fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination::new(
            self.page.unwrap_or(default.page),
            self.per_page.unwrap_or(default.per_page),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub filter: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductsQuery {
    pub fn filter(&self) -> SyncResult<ProductFilter> {
        self.filter.as_deref().unwrap_or_default().parse()
    }

    pub fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination::new(
            self.page.unwrap_or(default.page),
            self.per_page.unwrap_or(default.per_page),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MappingStatsRequest {
    pub products: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct SchedulerRequest {
    pub interval_minutes: u32,
}

/// Partial settings update; absent fields keep their stored value.
#[derive(Default, Deserialize)]
pub struct SettingsRequest {
    pub warehouse_credential: Option<String>,
    pub storefront_credential: Option<String>,
    pub sync_interval_minutes: Option<u32>,
}

impl SettingsRequest {
    pub fn apply(self, mut current: SyncSettings) -> SyncSettings {
        if let Some(token) = self.warehouse_credential {
            current.warehouse_credential = Some(token).filter(|t| !t.trim().is_empty());
        }
        if let Some(token) = self.storefront_credential {
            current.storefront_credential = Some(token).filter(|t| !t.trim().is_empty());
        }
        if let Some(minutes) = self.sync_interval_minutes {
            current.sync_interval_minutes = minutes;
        }
        current
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SavedMappingsResponse {
    pub saved: usize,
}

#[derive(Debug, Serialize)]
pub struct UnmapResponse {
    pub storefront_id: StorefrontId,
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearedLogsResponse {
    pub storefront_id: StorefrontId,
    pub deleted: u64,
}
