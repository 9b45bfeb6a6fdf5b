//! HuggingFace Inference API embedding provider.
//!
//! Calls the hosted feature-extraction pipeline. Requires `HF_TOKEN`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

use super::config::{resolve_hf_endpoint, resolve_hf_model, resolve_hf_token};
use super::provider::EmbeddingProvider;
use super::types::{huggingface_models, ProviderInfo};

/// HuggingFace Inference API embedding provider.
pub struct HuggingFaceProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    token: String,
    dimensions: usize,
    max_chars: usize,
}

impl HuggingFaceProvider {
    /// Create a provider from environment and config settings.
    ///
    /// Returns `None` if no API token is configured.
    pub fn new() -> Option<Self> {
        Self::with_config(None, None, None)
    }

    /// Create a provider with explicit overrides.
    ///
    /// Returns `None` if no non-empty token is available.
    pub fn with_config(
        endpoint: Option<String>,
        model: Option<String>,
        token: Option<String>,
    ) -> Option<Self> {
        let token = token.or_else(resolve_hf_token).filter(|t| !t.is_empty())?;
        let endpoint = endpoint.unwrap_or_else(resolve_hf_endpoint);
        let model = model.unwrap_or_else(resolve_hf_model);
        let config = huggingface_models::get_config(&model);

        Some(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            token,
            dimensions: config.dimensions,
            max_chars: config.max_chars,
        })
    }

    fn pipeline_url(&self) -> String {
        format!("{}/models/{}/pipeline/feature-extraction", self.endpoint, self.model)
    }

    async fn request(&self, inputs: HfInputs<'_>) -> Result<HfEmbedResponse> {
        let request = HfEmbedRequest {
            inputs,
            options: HfOptions { wait_for_model: true },
        };

        let response = self
            .client
            .post(self.pipeline_url())
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("HuggingFace request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("HuggingFace API error ({status}): {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse HuggingFace response: {e}")))
    }
}

/// Request body for feature extraction.
#[derive(Debug, Serialize)]
struct HfEmbedRequest<'a> {
    inputs: HfInputs<'a>,
    options: HfOptions,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum HfInputs<'a> {
    Single(&'a str),
    Batch(Vec<&'a str>),
}

#[derive(Debug, Serialize)]
struct HfOptions {
    wait_for_model: bool,
}

/// Feature-extraction responses come in three shapes depending on the model.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HfEmbedResponse {
    /// `[embedding]` per input, as sentence-transformers return them.
    Nested(Vec<Vec<f32>>),
    /// `[[embedding]]` per input for batched sentence-transformers calls.
    Batch(Vec<Vec<Vec<f32>>>),
    /// A bare vector from models that pool internally.
    Direct(Vec<f32>),
}

impl HfEmbedResponse {
    /// Flatten into one vector per input.
    fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            Self::Direct(embedding) => vec![embedding],
            Self::Nested(vectors) => vectors,
            Self::Batch(batch) => batch.into_iter().filter_map(|n| n.into_iter().next()).collect(),
        }
    }
}

impl EmbeddingProvider for HuggingFaceProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "huggingface".to_string(),
            model: self.model.clone(),
            dimensions: self.dimensions,
            max_chars: self.max_chars,
        }
    }

    async fn is_available(&self) -> bool {
        // Pinging the API costs rate-limit quota; a token is the only local signal.
        !self.token.is_empty()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(HfInputs::Single(text))
            .await?
            .into_vectors()
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("No embeddings in HuggingFace response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.request(HfInputs::Batch(texts.to_vec())).await?.into_vectors();
        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "HuggingFace returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}
