//! Process configuration read from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use crate::cache::MAX_TTL;

/// Default warehouse API root.
pub const DEFAULT_WAREHOUSE_BASE_URL: &str = "https://open.nhanh.vn/api";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://stockbridge.db?mode=rwc";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Where and as whom to reach the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseEndpoint {
    pub base_url: String,
    pub app_id: Option<String>,
    pub business_id: Option<String>,
    /// Depot whose per-location `available` figure is preferred.
    pub depot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontEndpoint {
    pub base_url: String,
    /// Storefront location whose inventory levels get overwritten.
    pub location_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub warehouse: WarehouseEndpoint,
    pub storefront: StorefrontEndpoint,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    pub max_concurrent: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let bind_raw = get("STOCKBRIDGE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "STOCKBRIDGE_BIND",
                message: e.to_string(),
            })?;

        let max_concurrent = parse_or(&get, "SYNC_MAX_CONCURRENCY", 4usize)?;
        if max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                key: "SYNC_MAX_CONCURRENCY",
                message: "must be at least 1".to_string(),
            });
        }

        let cache_ttl = Duration::from_secs(parse_or(&get, "INVENTORY_CACHE_TTL_SECS", 300u64)?);
        if cache_ttl > MAX_TTL {
            return Err(ConfigError::Invalid {
                key: "INVENTORY_CACHE_TTL_SECS",
                message: format!("must be at most {}", MAX_TTL.as_secs()),
            });
        }

        Ok(Self {
            database_url: get("STOCKBRIDGE_DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            warehouse: WarehouseEndpoint {
                base_url: trim_slash(
                    get("WAREHOUSE_BASE_URL").unwrap_or_else(|| DEFAULT_WAREHOUSE_BASE_URL.to_string()),
                ),
                app_id: get("WAREHOUSE_APP_ID"),
                business_id: get("WAREHOUSE_BUSINESS_ID"),
                depot_id: get("WAREHOUSE_DEPOT_ID"),
            },
            storefront: StorefrontEndpoint {
                base_url: trim_slash(required("STOREFRONT_BASE_URL")?),
                location_id: required("STOREFRONT_LOCATION_ID")?,
            },
            request_timeout: Duration::from_secs(parse_or(&get, "SYNC_REQUEST_TIMEOUT_SECS", 5u64)?),
            cache_ttl,
            max_concurrent,
        })
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("STOREFRONT_BASE_URL", "https://shop.example/admin/api/2024-01/"),
        ("STOREFRONT_LOCATION_ID", "655441491"),
    ];

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(MINIMAL)).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr, DEFAULT_BIND.parse().unwrap());
        assert_eq!(config.warehouse.base_url, DEFAULT_WAREHOUSE_BASE_URL);
        assert_eq!(config.storefront.base_url, "https://shop.example/admin/api/2024-01");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.warehouse.depot_id, None);
    }

    #[test]
    fn storefront_location_is_required() {
        let err = AppConfig::from_lookup(lookup(&[("STOREFRONT_BASE_URL", "http://x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("STOREFRONT_LOCATION_ID"));
    }

    #[test]
    fn bad_numbers_name_the_key() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("SYNC_REQUEST_TIMEOUT_SECS", "soon"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SYNC_REQUEST_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("SYNC_MAX_CONCURRENCY", "0"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn oversized_cache_ttl_is_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("INVENTORY_CACHE_TTL_SECS", "18446744073709551615"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "INVENTORY_CACHE_TTL_SECS", .. }));

        let mut pairs = MINIMAL.to_vec();
        pairs.push(("INVENTORY_CACHE_TTL_SECS", "604800"));
        assert_eq!(AppConfig::from_lookup(lookup(&pairs)).unwrap().cache_ttl, MAX_TTL);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("WAREHOUSE_DEPOT_ID", "   "));
        pairs.push(("WAREHOUSE_APP_ID", "73571"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.warehouse.depot_id, None);
        assert_eq!(config.warehouse.app_id.as_deref(), Some("73571"));
    }
}
