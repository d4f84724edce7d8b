//! Strongly-typed identifiers used across the sync engine.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncError;

/// Identifier of a product (variant) in the storefront catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorefrontId(String);

/// Identifier of a product in the warehouse/ERP catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseId(String);

/// Storefront inventory record whose level gets overwritten by a push.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

macro_rules! impl_string_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw identifier without validation.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = SyncError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(SyncError::validation(format!("{} must not be blank", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_string_id!(StorefrontId, "StorefrontId");
impl_string_id!(WarehouseId, "WarehouseId");
impl_string_id!(LocationId, "LocationId");

impl From<StorefrontId> for LocationId {
    fn from(value: StorefrontId) -> Self {
        Self(value.0)
    }
}

/// Identifier of a sync log entry.
///
/// UUIDv7, so ids sort in creation order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncLogId(Uuid);

impl SyncLogId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

}

impl Default for SyncLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SyncLogId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SyncLogId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| SyncError::validation(format!("SyncLogId: {e}")))?;
        Ok(Self(uuid))
    }
}
