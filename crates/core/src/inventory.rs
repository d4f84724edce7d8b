//! Warehouse stock snapshots and quantity extraction.
//!
//! The warehouse reports stock in several shapes: a top-level `remain`
//! figure, a generic `quantity` figure, and a per-location breakdown of
//! `available` units. Which figure is authoritative is decided by an
//! explicit, ordered list of [`QuantitySource`]s held by a
//! [`QuantityExtractor`]; the first source that yields a value wins and the
//! fallback is `0`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::WarehouseId;

/// Unit count of a product.
pub type Quantity = i64;

/// Stock held at one warehouse location (depot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationStock {
    #[serde(default)]
    pub available: Option<Quantity>,
}

/// Stock fields reported by the warehouse for one product.
///
/// This is what the inventory cache stores, so a cache hit can still answer
/// per-location questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStock {
    #[serde(default)]
    pub remain: Option<Quantity>,
    #[serde(default)]
    pub quantity: Option<Quantity>,
    #[serde(default)]
    pub locations: BTreeMap<String, LocationStock>,
}

impl WarehouseStock {
    pub fn with_remain(remain: Quantity) -> Self {
        Self {
            remain: Some(remain),
            ..Default::default()
        }
    }

    pub fn with_quantity(quantity: Quantity) -> Self {
        Self {
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    /// Add (or replace) the `available` figure for one location.
    pub fn with_location(mut self, location: impl Into<String>, available: Quantity) -> Self {
        self.locations.insert(
            location.into(),
            LocationStock {
                available: Some(available),
            },
        );
        self
    }
}

/// One rule for reading a quantity out of a [`WarehouseStock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantitySource {
    /// `available` units at the named location.
    LocationAvailable(String),
    /// Top-level `remain` figure.
    Remain,
    /// Generic `quantity` figure.
    Quantity,
}

impl QuantitySource {
    pub fn extract(&self, stock: &WarehouseStock) -> Option<Quantity> {
        match self {
            QuantitySource::LocationAvailable(location) => {
                stock.locations.get(location).and_then(|l| l.available)
            }
            QuantitySource::Remain => stock.remain,
            QuantitySource::Quantity => stock.quantity,
        }
    }
}

/// Ordered extraction strategy; first `Some` wins, else `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityExtractor {
    sources: Vec<QuantitySource>,
}

impl QuantityExtractor {
    pub fn new(sources: Vec<QuantitySource>) -> Self {
        Self { sources }
    }

    /// Standard precedence: the requested location (if any), then `remain`,
    /// then `quantity`.
    pub fn for_location(location: Option<&str>) -> Self {
        let mut sources = Vec::with_capacity(3);
        if let Some(location) = location {
            sources.push(QuantitySource::LocationAvailable(location.to_string()));
        }
        sources.push(QuantitySource::Remain);
        sources.push(QuantitySource::Quantity);
        Self { sources }
    }

    pub fn sources(&self) -> &[QuantitySource] {
        &self.sources
    }

    pub fn extract(&self, stock: &WarehouseStock) -> Quantity {
        self.sources
            .iter()
            .find_map(|source| source.extract(stock))
            .unwrap_or(0)
    }
}

impl Default for QuantityExtractor {
    fn default() -> Self {
        Self::for_location(None)
    }
}

/// A warehouse catalog search hit, shown to operators when linking products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseProduct {
    pub id: WarehouseId,
    pub code: String,
    pub name: String,
}
