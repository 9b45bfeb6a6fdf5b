//! Catalog import.
//!
//! Products arrive as JSONL, one record per line:
//! ```json
//! {"id":"p1","title":"Trail Runner","price":120,"rating":4.5,"status":"active","categoryId":"shoes"}
//! ```
//! Each product is fingerprinted by the SHA-256 of its embeddable text so
//! the embedding backfill only revisits products whose text changed.

mod file;
mod hash;
mod import;
mod types;

pub use file::read_jsonl;
pub use hash::{content_hash, product_hash};
pub use import::CatalogImporter;
pub use types::{ImportStats, ProductRecord, SyncError, SyncResult};
