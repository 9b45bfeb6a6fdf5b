//! Embedding provider trait.
//!
//! Defines the interface that all embedding providers must implement.
//! Uses async methods for HTTP-based providers.

use crate::error::Result;
use super::types::ProviderInfo;

use std::future::Future;
use std::pin::Pin;

/// Trait for embedding providers.
///
/// Implemented by the Ollama and HuggingFace providers, and by test fakes.
/// Failures (rate limit, network, quota) are returned unmodified; callers
/// decide whether to retry.
pub trait EmbeddingProvider: Send + Sync {
    /// Get provider metadata.
    fn info(&self) -> ProviderInfo;

    /// Check if the provider is reachable and configured.
    fn is_available(&self) -> impl Future<Output = bool> + Send;

    /// Embed a single text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;

    /// Embed several texts.
    ///
    /// Default implementation calls `embed` for each text.
    fn embed_batch(&self, texts: &[&str]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send {
        async move {
            let mut results = Vec::with_capacity(texts.len());
            for text in texts {
                results.push(self.embed(text).await?);
            }
            Ok(results)
        }
    }
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Boxed provider for runtime provider selection.
///
/// The trait returns `impl Future`, so it is not object-safe. This wrapper
/// erases the concrete provider behind an object-safe twin trait.
pub struct BoxedProvider {
    inner: Box<dyn EmbeddingProviderBoxed>,
}

/// Object-safe version of `EmbeddingProvider` for boxing.
trait EmbeddingProviderBoxed: Send + Sync {
    fn info(&self) -> ProviderInfo;
    fn is_available_boxed(&self) -> BoxFuture<'_, bool>;
    fn embed_boxed(&self, text: String) -> BoxFuture<'_, Result<Vec<f32>>>;
    fn embed_batch_boxed(&self, texts: Vec<String>) -> BoxFuture<'_, Result<Vec<Vec<f32>>>>;
}

impl BoxedProvider {
    /// Create a new boxed provider.
    pub fn new<P: EmbeddingProvider + 'static>(provider: P) -> Self {
        Self {
            inner: Box::new(BoxedProviderWrapper(provider)),
        }
    }
}

impl std::fmt::Debug for BoxedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = self.inner.info();
        f.debug_struct("BoxedProvider")
            .field("name", &info.name)
            .field("model", &info.model)
            .finish()
    }
}

impl EmbeddingProvider for BoxedProvider {
    fn info(&self) -> ProviderInfo {
        self.inner.info()
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available_boxed().await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inner.embed_boxed(text.to_string()).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let owned = texts.iter().map(|s| (*s).to_string()).collect();
        self.inner.embed_batch_boxed(owned).await
    }
}

/// Wrapper to implement `EmbeddingProviderBoxed` for any `EmbeddingProvider`.
struct BoxedProviderWrapper<P: EmbeddingProvider + 'static>(P);

impl<P: EmbeddingProvider + 'static> EmbeddingProviderBoxed for BoxedProviderWrapper<P> {
    fn info(&self) -> ProviderInfo {
        self.0.info()
    }

    fn is_available_boxed(&self) -> BoxFuture<'_, bool> {
        Box::pin(self.0.is_available())
    }

    fn embed_boxed(&self, text: String) -> BoxFuture<'_, Result<Vec<f32>>> {
        // Owned text keeps the future independent of the caller's borrow.
        Box::pin(async move { self.0.embed(&text).await })
    }

    fn embed_batch_boxed(&self, texts: Vec<String>) -> BoxFuture<'_, Result<Vec<Vec<f32>>>> {
        Box::pin(async move {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            self.0.embed_batch(&refs).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider;

    impl EmbeddingProvider for FixedProvider {
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "fixed".to_string(),
                model: "fixed-2d".to_string(),
                dimensions: 2,
                max_chars: 100,
            }
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    #[tokio::test]
    async fn test_boxed_provider_delegates() {
        let boxed = BoxedProvider::new(FixedProvider);
        assert_eq!(boxed.info().name, "fixed");
        assert!(boxed.is_available().await);
        assert_eq!(boxed.embed("abc").await.unwrap(), vec![3.0, 1.0]);
    }

    #[tokio::test]
    async fn test_default_batch_embeds_each_text() {
        let boxed = BoxedProvider::new(FixedProvider);
        let out = boxed.embed_batch(&["a", "bb"]).await.unwrap();
        assert_eq!(out, vec![vec![1.0, 1.0], vec![2.0, 1.0]]);
    }
}
