//! Hybrid product search.
//!
//! Combines structured filtering with embedding similarity ranking. See
//! [`SearchService`] for the two modes and their paging and counting rules.

pub mod query;
pub mod service;
pub mod similarity;
pub mod sort;

pub use query::{SearchHit, SearchQuery, SearchResultPage};
pub use service::{SearchMode, SearchPlan, SearchService};
pub use sort::{SortDirection, SortField, SortSpec};
