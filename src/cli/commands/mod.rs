//! Command implementations.

pub mod catalog;
pub mod completions;
pub mod embeddings;
pub mod init;
pub mod search;
pub mod version;

use std::path::PathBuf;

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteCatalog;

/// Open the catalog, failing if `sfs init` has not created it yet.
pub(crate) fn open_catalog(db_path: Option<&PathBuf>) -> Result<SqliteCatalog> {
    let path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;
    if !path.exists() {
        return Err(Error::NotInitialized);
    }
    SqliteCatalog::open(&path)
}

/// Runtime for the commands that talk to embedding providers.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}
