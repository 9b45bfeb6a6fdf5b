//! Catalog import from JSONL.
//!
//! Every record is validated before anything is written, so a bad line
//! leaves the catalog untouched. Records are then upserted by id; a changed
//! embeddable text clears the product's stored embedding.

use std::path::Path;

use crate::storage::{SqliteCatalog, UpsertOutcome};
use crate::sync::file::read_jsonl;
use crate::sync::hash::product_hash;
use crate::sync::types::{ImportStats, ProductRecord, SyncError, SyncResult};

/// Imports product records into a catalog.
pub struct CatalogImporter<'a> {
    store: &'a SqliteCatalog,
}

impl<'a> CatalogImporter<'a> {
    #[must_use]
    pub fn new(store: &'a SqliteCatalog) -> Self {
        Self { store }
    }

    /// Import a JSONL file.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidRecord` with the offending line if any
    /// record fails to parse or validate, or a database error if a write
    /// fails.
    pub fn import(&self, path: &Path) -> SyncResult<ImportStats> {
        let now = chrono::Utc::now().timestamp_millis();
        let records: Vec<(usize, ProductRecord)> = read_jsonl(path)?;

        let products = records
            .into_iter()
            .map(|(line, record)| {
                record
                    .into_product(now)
                    .map_err(|message| SyncError::InvalidRecord { line, message })
            })
            .collect::<SyncResult<Vec<_>>>()?;

        let mut stats = ImportStats::default();
        for product in &products {
            match self.store.upsert_product(product, &product_hash(product))? {
                UpsertOutcome::Inserted => stats.created += 1,
                UpsertOutcome::Updated { embedding_cleared } => {
                    stats.updated += 1;
                    if embedding_cleared {
                        stats.embeddings_invalidated += 1;
                    }
                }
            }
        }

        tracing::info!(
            path = %path.display(),
            created = stats.created,
            updated = stats.updated,
            invalidated = stats.embeddings_invalidated,
            "catalog import finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("catalog.jsonl");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_import_creates_then_updates() {
        let dir = TempDir::new().unwrap();
        let store = SqliteCatalog::open_memory().unwrap();
        let path = write(
            &dir,
            concat!(
                r#"{"id":"p1","title":"Mug","price":9,"status":"active"}"#,
                "\n",
                r#"{"id":"p2","title":"Bowl","price":12}"#,
                "\n"
            ),
        );

        let stats = CatalogImporter::new(&store).import(&path).unwrap();
        assert_eq!(stats, ImportStats { created: 2, updated: 0, embeddings_invalidated: 0 });

        store.set_embedding("p1", &[1.0, 0.0], "m", &product_hash(&store.get_product("p1").unwrap().unwrap())).unwrap();
        let path = write(&dir, r#"{"id":"p1","title":"Big Mug","price":9,"status":"active"}"#);
        let stats = CatalogImporter::new(&store).import(&path).unwrap();
        assert_eq!(stats, ImportStats { created: 0, updated: 1, embeddings_invalidated: 1 });
        assert_eq!(store.get_product("p1").unwrap().unwrap().title, "Big Mug");
    }

    #[test]
    fn test_invalid_line_aborts_before_writing() {
        let dir = TempDir::new().unwrap();
        let store = SqliteCatalog::open_memory().unwrap();
        let path = write(
            &dir,
            concat!(
                r#"{"id":"ok","title":"Mug","price":9}"#,
                "\n",
                r#"{"id":"bad","title":"Mug","price":-9}"#,
                "\n"
            ),
        );

        let err = CatalogImporter::new(&store).import(&path).unwrap_err();
        assert!(matches!(err, SyncError::InvalidRecord { line: 2, .. }));
        assert!(store.get_product("ok").unwrap().is_none());
    }
}
