//! Search planner and executor.
//!
//! [`SearchService::plan`] turns a [`SearchQuery`] into a [`SearchPlan`]
//! without touching any backend. [`SearchService::try_search`] executes the
//! plan:
//!
//! - **Browse** (no query text): filter, order by the requested or default
//!   key, page, and count every match.
//! - **Semantic** (query text): embed the text through the cache, filter on
//!   `similarity > page_threshold` for the page, and count on
//!   `similarity > count_threshold`. The count floor is higher than the page
//!   floor, so `total` can be smaller than the number of rows reachable by
//!   paging. Callers see that mismatch as-is.
//!
//! [`SearchService::search`] is the storefront-facing wrapper: any failure is
//! logged and turned into an empty page.

use std::fmt;

use serde::Serialize;

use crate::config::SearchSettings;
use crate::embeddings::{BoxedProvider, EmbeddingCache, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::storage::{CatalogFilter, CatalogPageRequest, CatalogStore, SimilarityClause};

use super::query::{SearchQuery, SearchResultPage};
use super::sort::SortSpec;

/// Ranking mode, chosen from the presence of query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Browse,
    Semantic,
}

impl SearchMode {
    #[must_use]
    pub fn for_query(query: &SearchQuery) -> Self {
        if query.query_text().is_some() {
            Self::Semantic
        } else {
            Self::Browse
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::Semantic => "semantic",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved search, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub mode: SearchMode,
    /// Trimmed query text; `Some` exactly in semantic mode.
    pub text: Option<String>,
    pub filter: CatalogFilter,
    pub sort: SortSpec,
    /// Effective 1-based page.
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
}

/// Hybrid product search over a catalog store.
pub struct SearchService<S, P = BoxedProvider> {
    store: S,
    cache: Option<EmbeddingCache<P>>,
    settings: SearchSettings,
}

impl<S: CatalogStore> SearchService<S, BoxedProvider> {
    /// A service without an embedding provider. Semantic queries fail
    /// (and `search` degrades them to an empty page).
    pub fn browse_only(store: S, settings: SearchSettings) -> Self {
        Self { store, cache: None, settings }
    }
}

impl<S: CatalogStore, P: EmbeddingProvider> SearchService<S, P> {
    pub fn new(store: S, cache: EmbeddingCache<P>, settings: SearchSettings) -> Self {
        Self {
            store,
            cache: Some(cache),
            settings,
        }
    }

    /// Build the service and its cache from one settings value.
    pub fn with_provider(store: S, provider: P, settings: SearchSettings) -> Self {
        let cache = EmbeddingCache::from_settings(provider, &settings);
        Self::new(store, cache, settings)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> Option<&EmbeddingCache<P>> {
        self.cache.as_ref()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Resolve mode, sort, and paging. Page 0 is treated as page 1.
    #[must_use]
    pub fn plan(&self, query: &SearchQuery) -> SearchPlan {
        let mode = SearchMode::for_query(query);
        let page = query.page.max(1);
        let limit = self.settings.page_size;

        SearchPlan {
            mode,
            text: query.query_text().map(str::to_string),
            filter: query.filter(),
            sort: SortSpec::resolve(query.sort.as_deref(), mode),
            page,
            limit,
            offset: u64::from(page - 1) * u64::from(limit),
        }
    }

    /// Execute a search and report backend failures.
    ///
    /// # Errors
    ///
    /// Returns the catalog store error, `Error::Embedding` from the provider,
    /// or `Error::EmbeddingTimeout` when the provider is too slow.
    pub async fn try_search(&self, query: &SearchQuery) -> Result<SearchResultPage> {
        let plan = self.plan(query);
        tracing::debug!(
            mode = %plan.mode,
            sort = %plan.sort,
            page = plan.page,
            "executing search"
        );

        let (page_clause, count_clause) = match plan.text.as_deref() {
            None => (None, None),
            Some(text) => {
                let embedding = self.embed_query(text).await?;
                (
                    Some(SimilarityClause {
                        query_embedding: embedding.clone(),
                        threshold: self.settings.page_threshold,
                    }),
                    Some(SimilarityClause {
                        query_embedding: embedding,
                        threshold: self.settings.count_threshold,
                    }),
                )
            }
        };

        let request = CatalogPageRequest {
            filter: plan.filter,
            similarity: page_clause,
            sort: plan.sort,
            limit: plan.limit,
            offset: plan.offset,
        };

        let (data, total) = tokio::try_join!(
            self.store.fetch_page(&request),
            self.store.count(&request.filter, count_clause.as_ref()),
        )?;

        Ok(SearchResultPage::new(data, total, self.settings.page_size))
    }

    /// Execute a search, degrading every failure to an empty page.
    ///
    /// The swallowed error is logged at `error` level so an outage can be
    /// told apart from "no results".
    pub async fn search(&self, query: &SearchQuery) -> SearchResultPage {
        match self.try_search(query).await {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    code = err.error_code().as_str(),
                    mode = %SearchMode::for_query(query),
                    page = query.page,
                    "search failed, returning empty page"
                );
                SearchResultPage::empty()
            }
        }
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let cache = self
            .cache
            .as_ref()
            .ok_or_else(|| Error::Embedding("No embedding provider configured".into()))?;

        let timeout = self.settings.embed_timeout();
        tokio::time::timeout(timeout, cache.get_or_compute(text))
            .await
            .map_err(|_| Error::EmbeddingTimeout {
                timeout_ms: self.settings.embed_timeout_ms,
            })?
    }
}

impl<S, P: EmbeddingProvider> fmt::Debug for SearchService<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchService")
            .field("cache", &self.cache)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SortField;
    use crate::storage::SqliteCatalog;

    fn service() -> SearchService<SqliteCatalog> {
        SearchService::browse_only(SqliteCatalog::open_memory().unwrap(), SearchSettings::default())
    }

    #[test]
    fn test_plan_browse_defaults() {
        let plan = service().plan(&SearchQuery::default());
        assert_eq!(plan.mode, SearchMode::Browse);
        assert_eq!(plan.sort, SortSpec::BROWSE_DEFAULT);
        assert_eq!((plan.limit, plan.offset), (12, 0));
        assert!(plan.text.is_none());
    }

    #[test]
    fn test_plan_semantic_and_paging() {
        let query = SearchQuery {
            page: 3,
            sort: Some("price.asc".into()),
            ..SearchQuery::text("  red shoes ")
        };
        let plan = service().plan(&query);
        assert_eq!(plan.mode, SearchMode::Semantic);
        assert_eq!(plan.text.as_deref(), Some("red shoes"));
        assert_eq!(plan.sort.field, SortField::Price);
        assert_eq!(plan.offset, 24);
    }

    #[test]
    fn test_plan_clamps_page_zero() {
        let plan = service().plan(&SearchQuery { page: 0, ..SearchQuery::default() });
        assert_eq!(plan.page, 1);
        assert_eq!(plan.offset, 0);
    }

    #[tokio::test]
    async fn test_semantic_without_provider_fails_soft() {
        let service = service();
        let query = SearchQuery::text("red shoes");
        assert!(matches!(service.try_search(&query).await, Err(Error::Embedding(_))));
        assert_eq!(service.search(&query).await, SearchResultPage::empty());
    }
}
