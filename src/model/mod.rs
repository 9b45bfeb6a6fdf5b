//! Data models for the storefront catalog.
//!
//! - [`Product`]: the full write-side record as stored in the catalog
//! - [`CatalogEntry`]: the read-only projection search returns
//! - [`ProductStatus`]: lifecycle state; only `active` products are searchable

pub mod product;

pub use product::{CatalogEntry, Product, ProductStatus};
