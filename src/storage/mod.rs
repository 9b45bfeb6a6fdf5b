//! Catalog storage.
//!
//! - [`catalog`] - the `CatalogStore` read interface search depends on
//! - [`schema`] - table definitions and the `cosine_similarity` SQL function
//! - [`sqlite`] - the SQLite implementation plus write helpers for import
//!   and embedding backfill

pub mod catalog;
pub mod schema;
pub mod sqlite;

pub use catalog::{CatalogFilter, CatalogPageRequest, CatalogStats, CatalogStore, SimilarityClause};
pub use sqlite::{SqliteCatalog, UpsertOutcome};
