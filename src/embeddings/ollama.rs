//! Ollama embedding provider.
//!
//! Talks to a local Ollama server (`/api/embed`) to embed search queries
//! and catalog text.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::config::{resolve_ollama_endpoint, resolve_ollama_model};
use super::provider::EmbeddingProvider;
use super::types::{ollama_models, ProviderInfo};

/// How long the availability probe waits for `/api/tags`.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Ollama embedding provider.
pub struct OllamaProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    max_chars: usize,
}

impl OllamaProvider {
    /// Create a provider from environment and config settings.
    pub fn new() -> Self {
        Self::with_config(None, None)
    }

    /// Create a provider with explicit overrides.
    pub fn with_config(endpoint: Option<String>, model: Option<String>) -> Self {
        let endpoint = endpoint.unwrap_or_else(resolve_ollama_endpoint);
        let model = model.unwrap_or_else(resolve_ollama_model);
        let config = ollama_models::get_config(&model);

        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            dimensions: config.dimensions,
            max_chars: config.max_chars,
        }
    }

    async fn request_embeddings(&self, input: EmbedInput<'_>) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.endpoint);
        let request = OllamaEmbedRequest { model: &self.model, input };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Ollama request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("Ollama returned {status}: {body}")));
        }

        let data: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse Ollama response: {e}")))?;

        Ok(data.embeddings)
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Response of `GET /api/tags`.
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Option<Vec<OllamaModel>>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

/// Request body of `POST /api/embed`.
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: EmbedInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbedInput<'a> {
    Single(&'a str),
    Batch(Vec<&'a str>),
}

/// Response of `POST /api/embed`.
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Whether a tag listing contains `model`, with or without a `:tag` suffix.
fn has_model(tags: &OllamaTagsResponse, model: &str) -> bool {
    tags.models.as_ref().is_some_and(|models| {
        models
            .iter()
            .any(|m| m.name == model || m.name.strip_prefix(model).is_some_and(|rest| rest.starts_with(':')))
    })
}

impl EmbeddingProvider for OllamaProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "ollama".to_string(),
            model: self.model.clone(),
            dimensions: self.dimensions,
            max_chars: self.max_chars,
        }
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);

        let Ok(response) = self.client.get(&url).timeout(PROBE_TIMEOUT).send().await else {
            return false;
        };
        if !response.status().is_success() {
            return false;
        }

        match response.json::<OllamaTagsResponse>().await {
            Ok(tags) => has_model(&tags, &self.model),
            Err(_) => false,
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request_embeddings(EmbedInput::Single(text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("No embeddings returned from Ollama".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.request_embeddings(EmbedInput::Batch(texts.to_vec())).await?;
        if embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_config_uses_model_table() {
        let provider = OllamaProvider::with_config(
            Some("http://custom:11434/".to_string()),
            Some("mxbai-embed-large".to_string()),
        );
        let info = provider.info();
        assert_eq!(info.name, "ollama");
        assert_eq!(info.model, "mxbai-embed-large");
        assert_eq!(info.dimensions, 1024);
        assert_eq!(provider.endpoint, "http://custom:11434");
    }

    #[test]
    fn test_has_model_accepts_tagged_names() {
        let tags: OllamaTagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"nomic-embed-text:latest"},{"name":"llama3"}]}"#,
        )
        .unwrap();
        assert!(has_model(&tags, "nomic-embed-text"));
        assert!(has_model(&tags, "llama3"));
        assert!(!has_model(&tags, "nomic-embed"));
    }

    #[test]
    fn test_single_input_serializes_as_string() {
        let request = OllamaEmbedRequest { model: "m", input: EmbedInput::Single("red shoes") };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"], "red shoes");
    }
}
