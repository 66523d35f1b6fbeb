//! HTTP request handlers for the tile API.

pub mod health;
pub mod stats;
pub mod tiles;

use tile_common::FilterSet;

/// Attribute filters accepted by both `/tiles` and `/stats`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterParams {
    /// Coarse label, matched against the category column.
    pub category: Option<String>,
    /// Fine label, matched against the subcategory column.
    pub subtype: Option<String>,
}

impl FilterParams {
    /// Collect filters from decoded query pairs.
    ///
    /// The first occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "category" => &mut params.category,
                "subtype" => &mut params.subtype,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    pub fn into_filter_set(self) -> FilterSet {
        FilterSet::new(self.category, self.subtype)
    }
}
