//! Embedding provider selection.

use super::config::{get_embedding_settings, is_embeddings_enabled};
use super::huggingface::HuggingFaceProvider;
use super::ollama::OllamaProvider;
use super::provider::{BoxedProvider, EmbeddingProvider};
use super::types::EmbeddingProviderType;

/// Which providers answered a probe.
#[derive(Debug, Clone)]
pub struct ProviderDetection {
    pub available: Vec<EmbeddingProviderType>,
    /// First available provider, Ollama before HuggingFace.
    pub recommended: Option<EmbeddingProviderType>,
}

/// Probe every supported provider.
pub async fn detect_available_providers() -> ProviderDetection {
    let mut available = Vec::new();

    if OllamaProvider::new().is_available().await {
        available.push(EmbeddingProviderType::Ollama);
    }
    if let Some(hf) = HuggingFaceProvider::new() {
        if hf.is_available().await {
            available.push(EmbeddingProviderType::Huggingface);
        }
    }

    let recommended = available.first().copied();
    ProviderDetection { available, recommended }
}

/// Build the configured embedding provider.
///
/// An explicit `provider` in the config file wins; otherwise Ollama is
/// tried before HuggingFace. Returns `None` when embeddings are disabled
/// or nothing is reachable, in which case only browse search works.
pub async fn create_embedding_provider() -> Option<BoxedProvider> {
    if !is_embeddings_enabled() {
        tracing::debug!("embeddings disabled");
        return None;
    }

    let configured = get_embedding_settings().ok().flatten().and_then(|s| s.provider);
    if let Some(provider_type) = configured {
        return create_provider_by_type(provider_type).await;
    }

    let ollama = OllamaProvider::new();
    if ollama.is_available().await {
        return Some(BoxedProvider::new(ollama));
    }

    match HuggingFaceProvider::new() {
        Some(hf) if hf.is_available().await => Some(BoxedProvider::new(hf)),
        _ => {
            tracing::debug!("no embedding provider available");
            None
        }
    }
}

async fn create_provider_by_type(provider_type: EmbeddingProviderType) -> Option<BoxedProvider> {
    match provider_type {
        EmbeddingProviderType::Ollama => {
            let provider = OllamaProvider::new();
            if provider.is_available().await {
                Some(BoxedProvider::new(provider))
            } else {
                tracing::warn!("configured Ollama provider is not reachable");
                None
            }
        }
        EmbeddingProviderType::Huggingface => HuggingFaceProvider::new().map(BoxedProvider::new),
    }
}

/// Ollama provider with explicit overrides, skipping the availability probe.
#[must_use]
pub fn create_ollama_provider(endpoint: Option<String>, model: Option<String>) -> BoxedProvider {
    BoxedProvider::new(OllamaProvider::with_config(endpoint, model))
}

/// HuggingFace provider with explicit overrides. `None` without a token.
#[must_use]
pub fn create_huggingface_provider(
    endpoint: Option<String>,
    model: Option<String>,
    token: Option<String>,
) -> Option<BoxedProvider> {
    HuggingFaceProvider::with_config(endpoint, model, token).map(BoxedProvider::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_huggingface_requires_token() {
        assert!(create_huggingface_provider(None, None, Some(String::new())).is_none());
        let provider = create_huggingface_provider(None, None, Some("tok".into())).unwrap();
        assert_eq!(provider.info().name, "huggingface");
    }

    #[test]
    fn test_explicit_ollama_keeps_model() {
        let provider = create_ollama_provider(None, Some("all-minilm".into()));
        assert_eq!(provider.info().model, "all-minilm");
    }
}
