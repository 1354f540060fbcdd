//! Query shapes: pagination, product search filters, inventory summaries.

use serde::{Deserialize, Serialize};

use crate::product::Properties;

/// Default number of rows returned by list and search calls.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A limit/offset window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    /// A zero limit falls back to `DEFAULT_PAGE_SIZE`.
    pub fn new(limit: usize, offset: usize) -> Self {
        let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
        Self { limit, offset }
    }

    /// Apply the window to an already ordered iterator.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, 0)
    }
}

/// Criteria for a product search.
///
/// `properties` is matched by equality per key, but only for keys the
/// category safelist admits; the rest are dropped before the store sees them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Free-text match against name and sku.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl FilterOptions {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

/// Stock value for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// `None` for products without a category.
    pub category_id: Option<String>,
    pub category_name: String,
    pub count: usize,
    /// Σ base_price × quantity.
    pub total_value: f64,
}

/// Aggregated inventory analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_items: usize,
    pub total_value: f64,
    pub category_breakdown: Vec<CategoryBreakdown>,
}
