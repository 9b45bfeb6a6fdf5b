//! Create the catalog database.
//!
//! The database lives at `~/.storefront-search/data/catalog.db` unless
//! `--db` or `SFS_DB` points elsewhere; `SFS_TEST_DB=1` switches to the
//! isolated `test/` directory.

use crate::config::{global_dir, resolve_db_path};
use crate::error::{Error, Result};
use crate::storage::SqliteCatalog;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    replaced: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `Error::AlreadyInitialized` if the database exists and `force`
/// is not set, or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("Could not determine database location".to_string()))?;

    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    if existed {
        fs::remove_file(&db_path)?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = PathBuf::from(format!("{}{suffix}", db_path.display()));
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
    }

    // Opening applies the schema.
    SqliteCatalog::open(&db_path)?;
    tracing::info!(path = %db_path.display(), replaced = existed, "catalog initialized");

    // Keep the global directory out of version control if someone adds it.
    if let Some(base) = global_dir().filter(|base| db_path.starts_with(base)) {
        let gitignore = base.join(".gitignore");
        if !gitignore.exists() {
            fs::write(gitignore, "# Local-only catalog data\n*\n")?;
        }
    }

    if json {
        let output = InitOutput { database: db_path, replaced: existed };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized catalog database");
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: sfs catalog import products.jsonl");
    }

    Ok(())
}
