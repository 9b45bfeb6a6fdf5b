//! Text embeddings for semantic search.
//!
//! Query text and catalog text are turned into vectors by an HTTP provider:
//! - **Ollama** (local), the default when reachable
//! - **HuggingFace** (hosted), requires `HF_TOKEN`
//!
//! ```text
//! SearchService ──► EmbeddingCache ──(miss)──► BoxedProvider
//!                                                 │
//!                                           ┌─────┴─────┐
//!                                           ▼           ▼
//!                                        Ollama    HuggingFace
//! ```
//!
//! # Configuration
//!
//! Settings live in the `embeddings` section of
//! `~/.storefront-search/config.json`. Environment variables take precedence:
//! - `OLLAMA_ENDPOINT` (default `http://localhost:11434`)
//! - `OLLAMA_MODEL` (default `nomic-embed-text`)
//! - `HF_TOKEN`, `HF_MODEL`, `HF_ENDPOINT`
//! - `SFS_EMBEDDINGS_ENABLED` (default `true`)

pub mod cache;
pub mod config;
pub mod factory;
pub mod huggingface;
pub mod ollama;
pub mod provider;
pub mod types;

pub use cache::{normalize_text, EmbeddingCache};
pub use config::{
    get_embedding_settings, is_embeddings_enabled, reset_embedding_settings,
    resolve_hf_model, resolve_hf_token, resolve_ollama_endpoint, resolve_ollama_model,
    save_embedding_settings,
};
pub use factory::{
    create_embedding_provider, create_huggingface_provider, create_ollama_provider,
    detect_available_providers, ProviderDetection,
};
pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;
pub use provider::{BoxedProvider, EmbeddingProvider};
pub use types::{EmbeddingProviderType, EmbeddingSettings, ModelConfig, ProviderInfo};
