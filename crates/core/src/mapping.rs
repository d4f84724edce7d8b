//! Storefront ↔ warehouse product mappings and mapping statistics.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::id::{LocationId, StorefrontId, WarehouseId};
use crate::pagination::{Page, Pagination};

/// Durable binding from a storefront product to a warehouse product.
///
/// The storefront id is the key: at most one warehouse id is bound to a
/// storefront id at a time. A warehouse id may back several storefront ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub storefront_id: StorefrontId,
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    /// Storefront inventory record to overwrite; defaults to the storefront id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_location_id: Option<LocationId>,
}

impl Mapping {
    pub fn new(
        storefront_id: impl Into<StorefrontId>,
        warehouse_id: impl Into<WarehouseId>,
        warehouse_name: impl Into<String>,
    ) -> Self {
        Self {
            storefront_id: storefront_id.into(),
            warehouse_id: warehouse_id.into(),
            warehouse_name: warehouse_name.into(),
            inventory_location_id: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<LocationId>) -> Self {
        self.inventory_location_id = Some(location.into());
        self
    }

    /// Storefront inventory record a reconciliation pushes to.
    pub fn location_id(&self) -> LocationId {
        self.inventory_location_id
            .clone()
            .unwrap_or_else(|| self.storefront_id.clone().into())
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.storefront_id.as_str().trim().is_empty() {
            return Err(SyncError::validation("storefront_id must not be blank"));
        }
        if self.warehouse_id.as_str().trim().is_empty() {
            return Err(SyncError::validation("warehouse_id must not be blank"));
        }
        if let Some(location) = &self.inventory_location_id {
            if location.as_str().trim().is_empty() {
                return Err(SyncError::validation("inventory_location_id must not be blank"));
            }
        }
        Ok(())
    }
}

/// Aggregate mapping counts over a set of known storefront ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingStats {
    pub total_products: usize,
    pub mapped_count: usize,
    pub unmapped_count: usize,
}

impl MappingStats {
    /// Count distinct `products`, splitting them by `is_mapped`.
    pub fn compute<'a, I, F>(products: I, is_mapped: F) -> Self
    where
        I: IntoIterator<Item = &'a StorefrontId>,
        F: Fn(&StorefrontId) -> bool,
    {
        let distinct: HashSet<&StorefrontId> = products.into_iter().collect();
        let mapped_count = distinct.iter().filter(|id| is_mapped(id)).count();
        Self {
            total_products: distinct.len(),
            mapped_count,
            unmapped_count: distinct.len() - mapped_count,
        }
    }
}

/// Which storefront products a listing should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductFilter {
    #[default]
    All,
    Mapped,
    Unmapped,
}

impl ProductFilter {
    pub fn accepts(&self, mapped: bool) -> bool {
        match self {
            ProductFilter::All => true,
            ProductFilter::Mapped => mapped,
            ProductFilter::Unmapped => !mapped,
        }
    }

    /// Filter the whole product list once, then page it.
    pub fn page<F>(
        &self,
        products: Vec<StorefrontId>,
        is_mapped: F,
        pagination: Pagination,
    ) -> Page<StorefrontId>
    where
        F: Fn(&StorefrontId) -> bool,
    {
        let filtered = products
            .into_iter()
            .filter(|id| self.accepts(is_mapped(id)))
            .collect();
        Page::paginate(filtered, pagination)
    }
}

impl core::str::FromStr for ProductFilter {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(ProductFilter::All),
            "mapped" => Ok(ProductFilter::Mapped),
            "unmapped" => Ok(ProductFilter::Unmapped),
            other => Err(SyncError::validation(format!(
                "filter must be one of: all, mapped, unmapped (got {other:?})"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(raw: &[&str]) -> Vec<StorefrontId> {
        raw.iter().map(|s| StorefrontId::new(*s)).collect()
    }

    #[test]
    fn location_defaults_to_storefront_id() {
        let m = Mapping::new("S1", "W1", "Blue mug");
        assert_eq!(m.location_id(), LocationId::new("S1"));

        let m = m.with_location("L1");
        assert_eq!(m.location_id(), LocationId::new("L1"));
    }

    #[test]
    fn blank_ids_fail_validation() {
        assert!(Mapping::new("S1", " ", "x").validate().is_err());
        assert!(Mapping::new("", "W1", "x").validate().is_err());
        assert!(Mapping::new("S1", "W1", "x").with_location("").validate().is_err());
        assert!(Mapping::new("S1", "W1", "").validate().is_ok());
    }

    #[test]
    fn stats_count_distinct_products() {
        let products = ids(&["a", "b", "b", "c"]);
        let mapped: HashSet<StorefrontId> = ids(&["b", "z"]).into_iter().collect();
        let stats = MappingStats::compute(&products, |id| mapped.contains(id));
        assert_eq!(
            stats,
            MappingStats {
                total_products: 3,
                mapped_count: 1,
                unmapped_count: 2
            }
        );
    }

    #[test]
    fn filter_total_counts_the_whole_filtered_set() {
        let products = ids(&["a", "b", "c", "d", "e"]);
        let mapped: HashSet<StorefrontId> = ids(&["a", "c", "e"]).into_iter().collect();

        let page = ProductFilter::Mapped.page(products, |id| mapped.contains(id), Pagination::new(1, 2));
        assert_eq!(page.items, ids(&["a", "c"]));
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn filter_parses() {
        assert_eq!("Mapped".parse::<ProductFilter>().unwrap(), ProductFilter::Mapped);
        assert_eq!("".parse::<ProductFilter>().unwrap(), ProductFilter::All);
        assert!("sometimes".parse::<ProductFilter>().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: with N known products of which M are mapped,
        /// mapped_count = M and unmapped_count = N - M.
        #[test]
        fn mapped_plus_unmapped_is_total(n in 0usize..200, m_seed in 0usize..200) {
            let m = if n == 0 { 0 } else { m_seed % (n + 1) };
            let products: Vec<StorefrontId> = (0..n).map(|i| StorefrontId::new(format!("s{i}"))).collect();
            let mapped: HashSet<StorefrontId> = products.iter().take(m).cloned().collect();

            let stats = MappingStats::compute(&products, |id| mapped.contains(id));
            prop_assert_eq!(stats.total_products, n);
            prop_assert_eq!(stats.mapped_count, m);
            prop_assert_eq!(stats.unmapped_count, n - m);
        }
    }
}
