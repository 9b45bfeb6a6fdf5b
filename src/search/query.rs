//! Search request and response shapes.

use serde::{Deserialize, Serialize};

use crate::model::CatalogEntry;
use crate::storage::CatalogFilter;

const fn default_page() -> u32 {
    1
}

/// One search request. Fully determines the result set and its order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Free text. Blank or absent means browse mode.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub subcategory_id: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    /// Lower bound on rating, 0 to 5.
    #[serde(default)]
    pub rating: Option<f64>,
    /// `"<field>.<direction>"`, e.g. `price.asc`.
    #[serde(default)]
    pub sort: Option<String>,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: None,
            category_id: None,
            subcategory_id: None,
            min_price: None,
            max_price: None,
            rating: None,
            sort: None,
            page: default_page(),
        }
    }
}

impl SearchQuery {
    /// A free-text query with no filters, first page.
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// The trimmed query text, or `None` when blank.
    #[must_use]
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Structured filters for the catalog store.
    #[must_use]
    pub fn filter(&self) -> CatalogFilter {
        CatalogFilter {
            category_id: self.category_id.clone(),
            subcategory_id: self.subcategory_id.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.rating,
        }
    }
}

/// A catalog entry in a result page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    /// Present in semantic mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

/// One page of results plus totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
    pub data: Vec<SearchHit>,
    pub total: u64,
    pub page_count: u64,
}

impl SearchResultPage {
    /// Build a page; `page_count` is `ceil(total / page_size)`.
    #[must_use]
    pub fn new(data: Vec<SearchHit>, total: u64, page_size: u32) -> Self {
        let page_count = total.div_ceil(u64::from(page_size.max(1)));
        Self { data, total, page_count }
    }

    /// The page returned when search fails.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_deserializes_with_defaults() {
        let query: SearchQuery =
            serde_json::from_str(r#"{"minPrice": 10, "categoryId": "shoes"}"#).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.min_price, Some(10.0));
        assert_eq!(query.category_id.as_deref(), Some("shoes"));
        assert!(query.query_text().is_none());
    }

    #[test]
    fn test_blank_query_text() {
        assert!(SearchQuery::text("   \n").query_text().is_none());
        assert_eq!(SearchQuery::text(" red shoes ").query_text(), Some("red shoes"));
    }

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(SearchResultPage::new(Vec::new(), 0, 12).page_count, 0);
        assert_eq!(SearchResultPage::new(Vec::new(), 12, 12).page_count, 1);
        assert_eq!(SearchResultPage::new(Vec::new(), 13, 12).page_count, 2);
    }

    #[test]
    fn test_empty_page_serializes_camel_case() {
        let json = serde_json::to_value(SearchResultPage::empty()).unwrap();
        assert_eq!(json, serde_json::json!({"data": [], "total": 0, "pageCount": 0}));
    }
}
