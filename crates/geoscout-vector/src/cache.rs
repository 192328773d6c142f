//! Lazily populated bounding box of the embeddings store.

use std::future::Future;

use geoscout_core::BoundingBox;
use tokio::sync::RwLock;

use crate::TRACING_TARGET_CACHE;
use crate::error::VectorResult;

/// Region returned when the store extent is unavailable (San Francisco).
pub const DEFAULT_FALLBACK_BBOX: BoundingBox = BoundingBox::new(37.70, -122.60, 37.85, -122.30);

/// Caches the first successfully computed store extent.
///
/// Population happens under the write lock, so concurrent first callers run
/// the extent query once. Fallback values are never cached and the cached
/// value is never invalidated: a store that grows after the first lookup
/// keeps reporting its old extent until [`reset`](Self::reset).
#[derive(Debug)]
pub struct BoundingBoxCache {
    cached: RwLock<Option<BoundingBox>>,
    fallback: BoundingBox,
}

impl Default for BoundingBoxCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBoxCache {
    /// Creates an empty cache with the default fallback region.
    pub fn new() -> Self {
        Self::with_fallback(DEFAULT_FALLBACK_BBOX)
    }

    /// Creates an empty cache with a custom fallback region.
    pub fn with_fallback(fallback: BoundingBox) -> Self {
        Self {
            cached: RwLock::new(None),
            fallback,
        }
    }

    /// Returns the cached extent without populating.
    pub async fn get(&self) -> Option<BoundingBox> {
        *self.cached.read().await
    }

    /// Returns the fallback region.
    pub fn fallback(&self) -> BoundingBox {
        self.fallback
    }

    /// Returns the cached extent, running `populate` on a miss.
    ///
    /// A successful non-empty result is cached; an empty result or an error
    /// yields the fallback without caching it.
    pub async fn get_or_populate<F, Fut>(&self, populate: F) -> BoundingBox
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = VectorResult<Option<BoundingBox>>>,
    {
        if let Some(bbox) = *self.cached.read().await {
            return bbox;
        }

        let mut guard = self.cached.write().await;
        if let Some(bbox) = *guard {
            return bbox;
        }

        match populate().await {
            Ok(Some(bbox)) => {
                tracing::info!(target: TRACING_TARGET_CACHE, %bbox, "Cached embeddings extent");
                *guard = Some(bbox);
                bbox
            }
            Ok(None) => {
                tracing::warn!(
                    target: TRACING_TARGET_CACHE,
                    fallback = %self.fallback,
                    "Embeddings store is empty, using fallback bounding box"
                );
                self.fallback
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_CACHE,
                    error = %err,
                    fallback = %self.fallback,
                    "Extent query failed, using fallback bounding box"
                );
                self.fallback
            }
        }
    }

    /// Clears the cached extent.
    pub async fn reset(&self) {
        *self.cached.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::VectorError;

    const EXTENT: BoundingBox = BoundingBox::new(37.75, -122.50, 37.80, -122.40);

    #[tokio::test]
    async fn caches_first_success() {
        let cache = BoundingBoxCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let bbox = cache
                .get_or_populate(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(EXTENT))
                })
                .await;
            assert_eq!(bbox, EXTENT);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get().await, Some(EXTENT));
    }

    #[tokio::test]
    async fn fallback_is_not_cached() {
        let cache = BoundingBoxCache::new();

        let bbox = cache
            .get_or_populate(|| async { Err(VectorError::query("no such table")) })
            .await;
        assert_eq!(bbox, DEFAULT_FALLBACK_BBOX);
        assert_eq!(cache.get().await, None);

        let bbox = cache.get_or_populate(|| async { Ok(None) }).await;
        assert_eq!(bbox, DEFAULT_FALLBACK_BBOX);

        let bbox = cache.get_or_populate(|| async { Ok(Some(EXTENT)) }).await;
        assert_eq!(bbox, EXTENT);
    }

    #[tokio::test]
    async fn reset_forces_repopulation() {
        let cache = BoundingBoxCache::new();
        cache.get_or_populate(|| async { Ok(Some(EXTENT)) }).await;
        cache.reset().await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_population_runs_once() {
        let cache = Arc::new(BoundingBoxCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..4).map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();
            async move {
                cache
                    .get_or_populate(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok(Some(EXTENT))
                    })
                    .await
            }
        });

        let results = futures::future::join_all(tasks).await;
        assert!(results.iter().all(|bbox| *bbox == EXTENT));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
