//! Search settings and the on-disk config file.
//!
//! The config file is shared by the search core and the embedding
//! providers:
//!
//! ```json
//! {
//!   "embeddings": { "provider": "ollama", "OLLAMA_MODEL": "nomic-embed-text" },
//!   "search": { "cache_max_entries": 1000, "cache_ttl_secs": 3600 }
//! }
//! ```
//!
//! Environment variables take precedence over the file:
//! - `SFS_CACHE_MAX_ENTRIES`, `SFS_CACHE_MAX_BYTES`, `SFS_CACHE_TTL_SECS`
//! - `SFS_EMBED_TIMEOUT_MS`
//!
//! Page size and the two similarity thresholds are fixed ([`PAGE_SIZE`],
//! [`PAGE_THRESHOLD`], [`COUNT_THRESHOLD`]) and cannot be set from either.

use crate::embeddings::EmbeddingSettings;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;
use std::time::Duration;

/// Results per page, shared by browse and semantic mode.
pub const PAGE_SIZE: u32 = 12;

/// Similarity a row must exceed to appear in a semantic page.
pub const PAGE_THRESHOLD: f64 = 0.63;

/// Similarity a row must exceed to count toward a semantic `total`.
/// Higher than [`PAGE_THRESHOLD`], so totals can undercount reachable rows.
pub const COUNT_THRESHOLD: f64 = 0.70;

/// Storefront search configuration file structure.
///
/// Stored at `~/.storefront-search/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorefrontConfig {
    pub embeddings: Option<EmbeddingSettings>,
    pub search: Option<SearchSettingsFile>,
}

/// Search overrides as written in the config file. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSettingsFile {
    pub cache_max_entries: Option<usize>,
    pub cache_max_bytes: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub embed_timeout_ms: Option<u64>,
}

/// Runtime parameters of the search core.
///
/// Only the cache and timeout fields are read from the config file and the
/// environment. The rest default to the fixed constants and are public so
/// embedders and tests can construct a service around other values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSettings {
    /// Results per page, shared by browse and semantic mode.
    pub page_size: u32,
    /// Similarity floor a row must exceed to appear in a page.
    pub page_threshold: f64,
    /// Similarity floor a row must exceed to count toward `total`.
    pub count_threshold: f64,
    pub cache_max_entries: usize,
    pub cache_max_bytes: usize,
    pub cache_ttl_secs: u64,
    /// Request-scoped timeout around the embedding provider call.
    pub embed_timeout_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            page_threshold: PAGE_THRESHOLD,
            count_threshold: COUNT_THRESHOLD,
            cache_max_entries: 1000,
            cache_max_bytes: 50 * 1024 * 1024,
            cache_ttl_secs: 60 * 60,
            embed_timeout_ms: 10_000,
        }
    }
}

impl SearchSettings {
    /// Cache entry time-to-live.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Embedding provider timeout.
    #[must_use]
    pub const fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }

    /// Overlay the non-empty fields of a config file section.
    #[must_use]
    pub fn merged_with(mut self, file: &SearchSettingsFile) -> Self {
        if let Some(v) = file.cache_max_entries {
            self.cache_max_entries = v;
        }
        if let Some(v) = file.cache_max_bytes {
            self.cache_max_bytes = v;
        }
        if let Some(v) = file.cache_ttl_secs {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = file.embed_timeout_ms {
            self.embed_timeout_ms = v;
        }
        self
    }

    /// Reject settings the search core cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".into()));
        }
        for (name, value) in [
            ("page_threshold", self.page_threshold),
            ("count_threshold", self.count_threshold),
        ] {
            if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{name} must be within -1.0..=1.0, got {value}")));
            }
        }
        if self.cache_max_entries == 0 {
            return Err(Error::Config("cache_max_entries must be at least 1".into()));
        }
        if self.embed_timeout_ms == 0 {
            return Err(Error::Config("embed_timeout_ms must be at least 1".into()));
        }
        Ok(())
    }
}

/// Load the full configuration file.
///
/// A missing file yields the default (empty) configuration.
///
/// # Errors
///
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<StorefrontConfig> {
    let path = super::config_file_path()
        .ok_or(Error::Config("Could not determine home directory".into()))?;

    if !path.exists() {
        return Ok(StorefrontConfig::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Save the full configuration file.
///
/// # Errors
///
/// Returns `Error::Config` if the directory or file cannot be written.
pub fn save_config(config: &StorefrontConfig) -> Result<()> {
    let path = super::config_file_path()
        .ok_or(Error::Config("Could not determine home directory".into()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

    fs::write(&path, content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;

    Ok(())
}

/// Resolve the effective search settings: env > config file > defaults.
///
/// # Errors
///
/// Returns `Error::Config` if the config file is unreadable, an environment
/// variable does not parse, or the merged settings fail validation.
pub fn resolve_search_settings() -> Result<SearchSettings> {
    let file = load_config()?.search.unwrap_or_default();
    let env = SearchSettingsFile {
        cache_max_entries: env_override("SFS_CACHE_MAX_ENTRIES")?,
        cache_max_bytes: env_override("SFS_CACHE_MAX_BYTES")?,
        cache_ttl_secs: env_override("SFS_CACHE_TTL_SECS")?,
        embed_timeout_ms: env_override("SFS_EMBED_TIMEOUT_MS")?,
    };

    let settings = SearchSettings::default().merged_with(&file).merged_with(&env);
    settings.validate()?;
    Ok(settings)
}

fn env_override<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} has an invalid value: {raw}"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_constants() {
        let settings = SearchSettings::default();
        assert_eq!(settings.page_threshold, 0.63);
        assert_eq!(settings.count_threshold, 0.7);
        assert!(settings.count_threshold > settings.page_threshold);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_only_present_fields() {
        let file = SearchSettingsFile {
            cache_max_entries: Some(24),
            cache_ttl_secs: Some(5),
            ..SearchSettingsFile::default()
        };
        let merged = SearchSettings::default().merged_with(&file);
        assert_eq!(merged.cache_max_entries, 24);
        assert_eq!(merged.cache_ttl(), Duration::from_secs(5));
        assert_eq!(merged.cache_max_bytes, 50 * 1024 * 1024);
        assert_eq!(merged.page_threshold, PAGE_THRESHOLD);
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let settings = SearchSettings { page_size: 0, ..SearchSettings::default() };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let settings = SearchSettings { count_threshold: 1.5, ..SearchSettings::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_config_file_parses_partial_search_section() {
        let config: StorefrontConfig =
            serde_json::from_str(r#"{"search":{"embed_timeout_ms":500}}"#).unwrap();
        assert_eq!(config.search.unwrap().embed_timeout_ms, Some(500));
        assert!(config.embeddings.is_none());
    }
}
