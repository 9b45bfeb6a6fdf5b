//! In-process embedding cache.
//!
//! Maps normalized query text to its embedding vector so repeated searches
//! skip the provider round trip. The cache is bounded twice: by entry count
//! and by aggregate byte size. Inserting past either bound evicts
//! least-recently-used entries until both hold again. Entries also expire
//! after a TTL; expiry is lazy, so a stale entry stays resident until LRU
//! pressure pushes it out but is never served.
//!
//! The mutex guards bookkeeping only. Provider calls happen outside it, so
//! two concurrent misses on the same text may both reach the provider.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::config::SearchSettings;
use crate::error::Result;

use super::provider::{BoxedProvider, EmbeddingProvider};

/// Bytes per stored vector component (f32).
const BYTES_PER_COMPONENT: usize = std::mem::size_of::<f32>();

#[derive(Debug, Clone)]
struct CacheEntry {
    vector: Vec<f32>,
    size: usize,
    inserted_at: Instant,
}

#[derive(Debug)]
struct CacheState {
    entries: LruCache<String, CacheEntry>,
    total_bytes: usize,
}

/// Bounded, TTL-aware cache in front of an [`EmbeddingProvider`].
pub struct EmbeddingCache<P = BoxedProvider> {
    provider: P,
    state: Mutex<CacheState>,
    max_entries: NonZeroUsize,
    max_bytes: usize,
    ttl: Duration,
}

/// Replace newlines with spaces. Both the cache key and the provider input
/// use this form.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.replace('\n', " ")
}

fn entry_size(key: &str, vector: &[f32]) -> usize {
    key.len() + vector.len() * BYTES_PER_COMPONENT
}

impl<P: EmbeddingProvider> EmbeddingCache<P> {
    /// Create an empty cache. A `max_entries` of zero is raised to one.
    pub fn new(provider: P, max_entries: usize, max_bytes: usize, ttl: Duration) -> Self {
        Self {
            provider,
            state: Mutex::new(CacheState {
                entries: LruCache::unbounded(),
                total_bytes: 0,
            }),
            max_entries: NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN),
            max_bytes,
            ttl,
        }
    }

    /// Create a cache sized from search settings.
    pub fn from_settings(provider: P, settings: &SearchSettings) -> Self {
        Self::new(
            provider,
            settings.cache_max_entries,
            settings.cache_max_bytes,
            settings.cache_ttl(),
        )
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Look up a live entry. Misses and expired entries return `None`
    /// without touching recency.
    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        let key = normalize_text(text);
        let mut state = self.state.lock();

        let fresh = state
            .entries
            .peek(&key)
            .map(|entry| entry.inserted_at.elapsed() < self.ttl)?;
        if !fresh {
            tracing::debug!(key_len = key.len(), "embedding cache entry expired");
            return None;
        }

        state.entries.get(&key).map(|entry| entry.vector.clone())
    }

    /// Insert or overwrite an entry, then evict until both bounds hold.
    pub fn set(&self, text: &str, vector: Vec<f32>) {
        let key = normalize_text(text);
        let size = entry_size(&key, &vector);
        let mut state = self.state.lock();

        let entry = CacheEntry {
            vector,
            size,
            inserted_at: Instant::now(),
        };
        if let Some(previous) = state.entries.put(key, entry) {
            state.total_bytes -= previous.size;
        }
        state.total_bytes += size;

        while state.entries.len() > self.max_entries.get() || state.total_bytes > self.max_bytes {
            let Some((_, evicted)) = state.entries.pop_lru() else {
                break;
            };
            state.total_bytes -= evicted.size;
            tracing::debug!(
                evicted_bytes = evicted.size,
                entries = state.entries.len(),
                total_bytes = state.total_bytes,
                "embedding cache eviction"
            );
        }
    }

    /// Return the cached vector, or embed the normalized text and cache it.
    ///
    /// # Errors
    ///
    /// Provider errors are returned unchanged and nothing is cached.
    pub async fn get_or_compute(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(vector) = self.get(text) {
            tracing::debug!("embedding cache hit");
            return Ok(vector);
        }

        tracing::debug!("embedding cache miss");
        let normalized = normalize_text(text);
        let vector = self.provider.embed(&normalized).await?;
        self.set(&normalized, vector.clone());
        Ok(vector)
    }

    /// Number of resident entries, expired ones included.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate size of resident entries.
    pub fn size_bytes(&self) -> usize {
        self.state.lock().total_bytes
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.total_bytes = 0;
    }
}

impl<P: EmbeddingProvider> std::fmt::Debug for EmbeddingCache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("EmbeddingCache")
            .field("provider", &self.provider.info().name)
            .field("entries", &state.entries.len())
            .field("total_bytes", &state.total_bytes)
            .field("max_entries", &self.max_entries)
            .field("max_bytes", &self.max_bytes)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::ProviderInfo;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl EmbeddingProvider for CountingProvider {
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "counting".into(),
                model: "test".into(),
                dimensions: 2,
                max_chars: 1000,
            }
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Embedding("rate limited".into()));
            }
            assert!(!text.contains('\n'));
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn cache(max_entries: usize, max_bytes: usize) -> EmbeddingCache<CountingProvider> {
        EmbeddingCache::new(
            CountingProvider::default(),
            max_entries,
            max_bytes,
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_get_or_compute_calls_provider_once() {
        let cache = cache(10, 1024);
        let first = cache.get_or_compute("red shoes").await.unwrap();
        let second = cache.get_or_compute("red shoes").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.provider().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_newlines_share_a_key() {
        let cache = cache(10, 1024);
        cache.get_or_compute("red\nshoes").await.unwrap();
        assert!(cache.get("red shoes").is_some());
        cache.get_or_compute("red shoes").await.unwrap();
        assert_eq!(cache.provider().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_errors_are_not_cached() {
        let cache = EmbeddingCache::new(
            CountingProvider { fail: true, ..Default::default() },
            10,
            1024,
            Duration::from_secs(60),
        );

        assert!(matches!(cache.get_or_compute("x").await, Err(Error::Embedding(_))));
        assert!(cache.get_or_compute("x").await.is_err());
        assert_eq!(cache.provider().calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_count_bound_evicts_lru() {
        let cache = cache(2, 1024);
        cache.set("a", vec![1.0]);
        cache.set("b", vec![2.0]);
        assert!(cache.get("a").is_some());
        cache.set("c", vec![3.0]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_byte_bound_evicts_until_under_cap() {
        // Each entry is 1 + 4 * 4 = 17 bytes.
        let cache = cache(100, 40);
        cache.set("a", vec![0.0; 4]);
        cache.set("b", vec![0.0; 4]);
        assert_eq!(cache.size_bytes(), 34);

        cache.set("c", vec![0.0; 4]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.size_bytes(), 34);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_oversized_entry_is_not_retained() {
        let cache = cache(100, 8);
        cache.set("big", vec![0.0; 16]);
        assert!(cache.is_empty());
        assert_eq!(cache.size_bytes(), 0);
    }

    #[test]
    fn test_overwrite_replaces_size() {
        let cache = cache(10, 1024);
        cache.set("a", vec![0.0; 4]);
        cache.set("a", vec![0.0; 2]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size_bytes(), 1 + 8);
    }

    #[test]
    fn test_expired_entries_read_as_absent() {
        let cache = EmbeddingCache::new(CountingProvider::default(), 10, 1024, Duration::ZERO);
        cache.set("a", vec![1.0]);
        assert!(cache.get("a").is_none());
        // Lazily expired: still resident.
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_or_compute_holds_bounds() {
        let cache = std::sync::Arc::new(cache(5, 60));

        let tasks: Vec<_> = (0..200)
            .map(|i| {
                let cache = std::sync::Arc::clone(&cache);
                tokio::spawn(async move { cache.get_or_compute(&format!("q{}", i % 20)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert!(cache.len() <= 5);
        assert!(cache.size_bytes() <= 60);
        let state = cache.state.lock();
        let resident: usize = state.entries.iter().map(|(_, entry)| entry.size).sum();
        assert_eq!(resident, state.total_bytes);
    }

    #[test]
    fn test_clear_resets_bytes() {
        let cache = cache(10, 1024);
        cache.set("a", vec![1.0, 2.0]);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.size_bytes(), 0);
    }
}
