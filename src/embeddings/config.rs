//! Embedding provider settings.
//!
//! Loads and saves the `embeddings` section of the config file and
//! resolves each provider knob with env > config > default priority.

use crate::config::{load_config, save_config};
use crate::error::Result;

use super::types::EmbeddingSettings;

/// Get embedding settings from the config file.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn get_embedding_settings() -> Result<Option<EmbeddingSettings>> {
    let config = load_config()?;
    Ok(config.embeddings)
}

/// Save embedding settings (merges with existing config).
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written.
pub fn save_embedding_settings(settings: &EmbeddingSettings) -> Result<()> {
    let mut config = load_config()?;
    let existing = config.embeddings.unwrap_or_default();
    config.embeddings = Some(merge_settings(settings, existing));
    save_config(&config)
}

/// Reset embedding settings (removes them from the config file).
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written.
pub fn reset_embedding_settings() -> Result<()> {
    let mut config = load_config()?;
    config.embeddings = None;
    save_config(&config)
}

/// Fields set in `update` win; everything else keeps its existing value.
fn merge_settings(update: &EmbeddingSettings, existing: EmbeddingSettings) -> EmbeddingSettings {
    EmbeddingSettings {
        enabled: update.enabled.or(existing.enabled),
        provider: update.provider.or(existing.provider),
        HF_TOKEN: update.HF_TOKEN.clone().or(existing.HF_TOKEN),
        HF_MODEL: update.HF_MODEL.clone().or(existing.HF_MODEL),
        HF_ENDPOINT: update.HF_ENDPOINT.clone().or(existing.HF_ENDPOINT),
        OLLAMA_ENDPOINT: update.OLLAMA_ENDPOINT.clone().or(existing.OLLAMA_ENDPOINT),
        OLLAMA_MODEL: update.OLLAMA_MODEL.clone().or(existing.OLLAMA_MODEL),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn settings_field(pick: impl FnOnce(EmbeddingSettings) -> Option<String>) -> Option<String> {
    get_embedding_settings().ok().flatten().and_then(pick)
}

/// Resolve Ollama endpoint from environment or config.
pub fn resolve_ollama_endpoint() -> String {
    non_empty_env("OLLAMA_ENDPOINT")
        .or_else(|| settings_field(|s| s.OLLAMA_ENDPOINT))
        .unwrap_or_else(|| "http://localhost:11434".to_string())
}

/// Resolve Ollama model from environment or config.
pub fn resolve_ollama_model() -> String {
    non_empty_env("OLLAMA_MODEL")
        .or_else(|| settings_field(|s| s.OLLAMA_MODEL))
        .unwrap_or_else(|| "nomic-embed-text".to_string())
}

/// Resolve HuggingFace token from environment or config.
pub fn resolve_hf_token() -> Option<String> {
    non_empty_env("HF_TOKEN").or_else(|| settings_field(|s| s.HF_TOKEN))
}

/// Resolve HuggingFace model from environment or config.
pub fn resolve_hf_model() -> String {
    non_empty_env("HF_MODEL")
        .or_else(|| settings_field(|s| s.HF_MODEL))
        .unwrap_or_else(|| "sentence-transformers/all-MiniLM-L6-v2".to_string())
}

/// Resolve HuggingFace endpoint from environment or config.
pub fn resolve_hf_endpoint() -> String {
    non_empty_env("HF_ENDPOINT")
        .or_else(|| settings_field(|s| s.HF_ENDPOINT))
        .unwrap_or_else(|| "https://router.huggingface.co/hf-inference".to_string())
}

/// Check if embeddings are enabled.
///
/// Without embeddings every search runs in browse mode only.
pub fn is_embeddings_enabled() -> bool {
    if let Ok(enabled) = std::env::var("SFS_EMBEDDINGS_ENABLED") {
        return enabled != "false" && enabled != "0";
    }

    if let Ok(Some(settings)) = get_embedding_settings() {
        return settings.enabled.unwrap_or(true);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::EmbeddingProviderType;

    #[test]
    fn test_merge_keeps_existing_when_update_is_empty() {
        let existing = EmbeddingSettings {
            provider: Some(EmbeddingProviderType::Ollama),
            OLLAMA_MODEL: Some("all-minilm".to_string()),
            ..EmbeddingSettings::default()
        };
        let merged = merge_settings(&EmbeddingSettings::default(), existing);
        assert_eq!(merged.provider, Some(EmbeddingProviderType::Ollama));
        assert_eq!(merged.OLLAMA_MODEL.as_deref(), Some("all-minilm"));
    }

    #[test]
    fn test_merge_update_wins() {
        let existing = EmbeddingSettings {
            enabled: Some(true),
            HF_MODEL: Some("old".to_string()),
            ..EmbeddingSettings::default()
        };
        let update = EmbeddingSettings {
            enabled: Some(false),
            HF_MODEL: Some("new".to_string()),
            ..EmbeddingSettings::default()
        };
        let merged = merge_settings(&update, existing);
        assert_eq!(merged.enabled, Some(false));
        assert_eq!(merged.HF_MODEL.as_deref(), Some("new"));
    }

    #[test]
    fn test_default_ollama_model_is_not_empty() {
        assert!(!resolve_ollama_model().is_empty());
    }
}
