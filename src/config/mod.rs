//! Configuration management.
//!
//! This module resolves where the catalog database lives and loads the
//! search and embedding settings from `~/.storefront-search/config.json`.
//!
//! # Resolution order
//!
//! Environment variables beat the config file, which beats built-in
//! defaults. See [`settings`] for the individual knobs.

mod settings;

pub use settings::{
    load_config, resolve_search_settings, save_config, SearchSettings, SearchSettingsFile,
    StorefrontConfig, COUNT_THRESHOLD, PAGE_SIZE, PAGE_THRESHOLD,
};

use std::path::{Path, PathBuf};

/// Name of the global directory under the user's home.
const GLOBAL_DIR_NAME: &str = ".storefront-search";

/// Database filename inside the data (or test) directory.
const DB_FILE_NAME: &str = "catalog.db";

/// Get the global storefront-search directory location (`~/.storefront-search/`).
#[must_use]
pub fn global_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(GLOBAL_DIR_NAME))
}

/// Path of the JSON config file.
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    global_dir().map(|dir| dir.join("config.json"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `SFS_TEST_DB=1` (or any non-empty value).
/// This redirects all database operations to an isolated test database.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("SFS_TEST_DB").map(|v| is_truthy(&v)).unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && value.to_lowercase() != "false"
}

/// Get the test database path (`~/.storefront-search/test/catalog.db`).
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_dir().map(|dir| dir.join("test").join(DB_FILE_NAME))
}

/// Default database path (`~/.storefront-search/data/catalog.db`).
#[must_use]
pub fn default_db_path() -> Option<PathBuf> {
    global_dir().map(|dir| dir.join("data").join(DB_FILE_NAME))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `SFS_TEST_DB` environment variable → uses test database
/// 3. `SFS_DB` environment variable
/// 4. Global location: `~/.storefront-search/data/catalog.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Ok(db_path) = std::env::var("SFS_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    default_db_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/catalog.sqlite");
        let result = resolve_db_path(Some(&explicit));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_default_db_path_is_under_data() {
        let path = default_db_path().unwrap();
        assert!(path.ends_with("data/catalog.db"));
    }

    #[test]
    fn test_test_db_path_is_separate() {
        let test = test_db_path().unwrap();
        assert!(test.to_string_lossy().contains("/test/"));
        assert_ne!(default_db_path().unwrap(), test);
    }

    #[test]
    fn test_truthy_parsing() {
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("FALSE"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
    }
}
