//! Catalog store interface consumed by search.

use std::future::Future;

use crate::error::Result;
use crate::search::{SearchHit, SortSpec};

/// Structured filters shared by browse and semantic search.
///
/// Every present field narrows the result (AND semantics). Only active
/// products are ever considered, regardless of the filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<f64>,
    /// Inclusive upper price bound.
    pub max_price: Option<f64>,
    /// Inclusive lower rating bound.
    pub min_rating: Option<f64>,
}

/// Similarity against a query embedding, used both as a projected column
/// and as a strict `similarity > threshold` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityClause {
    pub query_embedding: Vec<f32>,
    pub threshold: f64,
}

/// One page read against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPageRequest {
    pub filter: CatalogFilter,
    pub similarity: Option<SimilarityClause>,
    /// Primary order. Stores append `id ASC` as a tie-break.
    pub sort: SortSpec,
    pub limit: u32,
    pub offset: u64,
}

/// Read side of the product catalog.
///
/// The two reads are independent; a store without snapshot isolation may
/// answer them from slightly different states.
pub trait CatalogStore: Send + Sync {
    /// Fetch one page of active products. When `request.similarity` is set,
    /// each hit carries its similarity score and rows at or below the
    /// threshold are excluded.
    fn fetch_page(
        &self,
        request: &CatalogPageRequest,
    ) -> impl Future<Output = Result<Vec<SearchHit>>> + Send;

    /// Count active products matching `filter` and, when given, passing
    /// the similarity predicate.
    fn count(
        &self,
        filter: &CatalogFilter,
        similarity: Option<&SimilarityClause>,
    ) -> impl Future<Output = Result<u64>> + Send;
}

/// Aggregate counts for `sfs catalog stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CatalogStats {
    pub total: u64,
    pub active: u64,
    /// Products with an embedding matching their current text.
    pub embedded: u64,
    /// Products whose embedding is missing or predates a text change.
    pub pending: u64,
}
