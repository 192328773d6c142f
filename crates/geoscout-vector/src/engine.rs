//! Batched similarity search over feature points.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use futures::stream;
use geoscout_core::{BoundingBox, EmbeddingMatch, FeaturePoint, FeatureResult, MatchStatus};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_ENGINE;
use crate::cache::BoundingBoxCache;
use crate::config::EngineConfig;
use crate::error::{VectorError, VectorResult};
use crate::store::EmbeddingStore;

/// Results of one batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// One result per input point.
    pub results: Vec<FeatureResult>,
    /// Set when at least one point failed or timed out.
    pub degraded: bool,
}

impl BatchOutcome {
    /// Number of points whose lookup failed or timed out.
    pub fn degraded_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.status.is_degraded())
            .count()
    }
}

/// Resolves similar imagery chips for batches of feature points.
#[derive(Clone)]
pub struct SimilarityEngine {
    store: Arc<dyn EmbeddingStore>,
    cache: Arc<BoundingBoxCache>,
    config: EngineConfig,
}

impl std::fmt::Debug for SimilarityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SimilarityEngine {
    /// Creates an engine over the given store and cache.
    pub fn new(
        store: Arc<dyn EmbeddingStore>,
        cache: Arc<BoundingBoxCache>,
        config: EngineConfig,
    ) -> VectorResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            cache,
            config,
        })
    }

    /// Gets the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Gets the shared bounding box cache.
    pub fn cache(&self) -> &Arc<BoundingBoxCache> {
        &self.cache
    }

    /// Returns the extent of the embeddings store.
    ///
    /// Served from the cache when populated; otherwise one extent query is
    /// run under the per-point deadline. Failures, timeouts and empty stores
    /// yield the fallback region uncached.
    pub async fn bounding_box(&self) -> BoundingBox {
        let deadline = self.config.point_timeout();
        self.cache
            .get_or_populate(|| async move {
                tokio::time::timeout(deadline, self.store.extent())
                    .await
                    .map_err(|_| {
                        VectorError::timeout(format!(
                            "extent query exceeded {}ms",
                            deadline.as_millis()
                        ))
                    })?
            })
            .await
    }

    /// Finds the `top_k` most similar chips for every point.
    ///
    /// Every input point gets exactly one result, in input order. A point
    /// whose lookup fails or exceeds the per-point deadline yields an empty
    /// result with a degraded status; its siblings are unaffected. A `top_k`
    /// of zero uses the configured default.
    #[tracing::instrument(skip_all, fields(points = points.len(), top_k = top_k))]
    pub async fn batch_find_similar(&self, points: &[FeaturePoint], top_k: usize) -> BatchOutcome {
        if points.is_empty() {
            return BatchOutcome::default();
        }

        let top_k = if top_k == 0 { self.config.top_k } else { top_k };
        let deadline = self.config.point_timeout();
        let started = Instant::now();

        let resolved: Vec<FeatureResult> = stream::iter(0..points.len())
            .map(|i| self.resolve_point(&points[i], top_k, deadline))
            .buffer_unordered(self.config.max_concurrency)
            .collect()
            .await;

        let results = join_by_index(points, resolved);
        let outcome = BatchOutcome {
            degraded: results.iter().any(|result| result.status.is_degraded()),
            results,
        };

        tracing::info!(
            target: TRACING_TARGET_ENGINE,
            points = points.len(),
            degraded = outcome.degraded_count(),
            elapsed_ms = started.elapsed().as_millis(),
            "Similarity batch completed"
        );

        outcome
    }

    /// Resolves a single point, absorbing every failure into its status.
    async fn resolve_point(
        &self,
        point: &FeaturePoint,
        top_k: usize,
        deadline: Duration,
    ) -> FeatureResult {
        if point.coordinates_missing {
            tracing::debug!(
                target: TRACING_TARGET_ENGINE,
                index = point.index,
                "Skipping lookup for feature without coordinates"
            );
            return FeatureResult::empty(point.clone(), MatchStatus::NoContainingChip);
        }

        let lookup = self
            .store
            .find_similar(point.longitude, point.latitude, top_k);

        match tokio::time::timeout(deadline, lookup).await {
            Ok(Ok(similar)) => match similar.anchor {
                Some(anchor) => {
                    let matches = rank_matches(similar.matches, &anchor, top_k);
                    FeatureResult::matched(point.clone(), matches)
                }
                None => FeatureResult::empty(point.clone(), MatchStatus::NoContainingChip),
            },
            Ok(Err(err)) => {
                tracing::warn!(
                    target: TRACING_TARGET_ENGINE,
                    index = point.index,
                    error = %err,
                    "Similarity lookup failed"
                );
                FeatureResult::empty(point.clone(), MatchStatus::Failed(err.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    target: TRACING_TARGET_ENGINE,
                    index = point.index,
                    timeout_ms = deadline.as_millis(),
                    "Similarity lookup timed out"
                );
                FeatureResult::empty(point.clone(), MatchStatus::TimedOut)
            }
        }
    }
}

/// Drops the anchor chip, orders by rank and truncates.
fn rank_matches(mut matches: Vec<EmbeddingMatch>, anchor: &str, top_k: usize) -> Vec<EmbeddingMatch> {
    matches.retain(|m| m.chip_id != anchor);
    matches.sort_by(EmbeddingMatch::rank_cmp);
    matches.truncate(top_k);
    matches
}

/// Re-associates out-of-order results with their input points by index.
fn join_by_index(points: &[FeaturePoint], resolved: Vec<FeatureResult>) -> Vec<FeatureResult> {
    let mut by_index: HashMap<usize, VecDeque<FeatureResult>> = HashMap::new();
    for result in resolved {
        by_index
            .entry(result.feature.index)
            .or_default()
            .push_back(result);
    }

    points
        .iter()
        .map(|point| {
            by_index
                .get_mut(&point.index)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| {
                    FeatureResult::empty(
                        point.clone(),
                        MatchStatus::Failed("lookup result missing".to_string()),
                    )
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_FALLBACK_BBOX, MockChip, MockEmbeddingStore};

    /// Footprints around San Francisco landmarks with 2-d embeddings.
    fn chips() -> Vec<MockChip> {
        vec![
            MockChip::new("marina", BoundingBox::new(37.80, -122.45, 37.81, -122.43), vec![1.0, 0.0]),
            MockChip::new("harbor", BoundingBox::new(37.77, -122.39, 37.78, -122.38), vec![0.9, 0.1]),
            MockChip::new("pier", BoundingBox::new(37.80, -122.42, 37.81, -122.40), vec![0.7, 0.3]),
            MockChip::new("park", BoundingBox::new(37.76, -122.49, 37.77, -122.45), vec![0.0, 1.0]),
        ]
    }

    fn engine(store: MockEmbeddingStore) -> (SimilarityEngine, Arc<MockEmbeddingStore>) {
        let store = Arc::new(store);
        let engine = SimilarityEngine::new(
            store.clone(),
            Arc::new(BoundingBoxCache::new()),
            EngineConfig::default().with_point_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        (engine, store)
    }

    fn point(index: usize, lon: f64, lat: f64) -> FeaturePoint {
        FeaturePoint::new(index, lon, lat)
    }

    #[tokio::test]
    async fn ranks_neighbours_of_containing_chip() {
        let (engine, _) = engine(MockEmbeddingStore::new(chips()));
        let outcome = engine
            .batch_find_similar(&[point(0, -122.44, 37.805)], 5)
            .await;

        let result = &outcome.results[0];
        assert_eq!(result.status, MatchStatus::Matched);
        let ids: Vec<_> = result.matches.iter().map(|m| m.chip_id.as_str()).collect();
        assert_eq!(ids, ["harbor", "pier", "park"]);
        assert!(result.matches.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert!(!outcome.degraded);
    }

    #[tokio::test]
    async fn one_failure_keeps_order_and_siblings() {
        let store = MockEmbeddingStore::new(chips()).with_failure_at(-122.41, 37.805, "boom");
        let (engine, _) = engine(store);
        let points = [
            point(0, -122.44, 37.805),
            point(1, -122.41, 37.805),
            point(2, -122.385, 37.775),
        ];

        let outcome = engine.batch_find_similar(&points, 5).await;

        assert_eq!(outcome.results.len(), 3);
        let indices: Vec<_> = outcome.results.iter().map(|r| r.feature.index).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert_eq!(outcome.results[1].status, MatchStatus::Failed("query error: boom".into()));
        assert!(outcome.results[1].matches.is_empty());
        assert!(!outcome.results[0].matches.is_empty());
        assert!(!outcome.results[2].matches.is_empty());
        assert!(outcome.degraded);
        assert_eq!(outcome.degraded_count(), 1);
    }

    #[tokio::test]
    async fn point_outside_every_footprint_has_no_matches() {
        let (engine, _) = engine(MockEmbeddingStore::new(chips()));
        let outcome = engine.batch_find_similar(&[point(0, 0.0, 0.0)], 5).await;

        assert_eq!(outcome.results[0].status, MatchStatus::NoContainingChip);
        assert!(outcome.results[0].matches.is_empty());
        assert!(!outcome.degraded);
    }

    #[tokio::test]
    async fn anchor_is_never_returned() {
        let store = MockEmbeddingStore::new(chips()).with_anchor_in_results();
        let (engine, _) = engine(store);
        let outcome = engine
            .batch_find_similar(&[point(0, -122.44, 37.805)], 5)
            .await;

        assert!(outcome.results[0].matches.iter().all(|m| m.chip_id != "marina"));
        assert_eq!(outcome.results[0].matches.len(), 3);
    }

    #[tokio::test]
    async fn truncates_to_top_k() {
        let (engine, _) = engine(MockEmbeddingStore::new(chips()));
        let outcome = engine
            .batch_find_similar(&[point(0, -122.44, 37.805)], 2)
            .await;
        assert_eq!(outcome.results[0].matches.len(), 2);
    }

    #[tokio::test]
    async fn missing_coordinates_skip_the_store() {
        let (engine, store) = engine(MockEmbeddingStore::new(chips()));
        let outcome = engine
            .batch_find_similar(&[FeaturePoint::without_coordinates(0)], 5)
            .await;

        assert_eq!(outcome.results[0].status, MatchStatus::NoContainingChip);
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_point_times_out() {
        let store = MockEmbeddingStore::new(chips()).with_delay_at(
            -122.41,
            37.805,
            Duration::from_secs(30),
        );
        let (engine, _) = engine(store);
        let points = [point(0, -122.44, 37.805), point(1, -122.41, 37.805)];

        let outcome = engine.batch_find_similar(&points, 5).await;

        assert_eq!(outcome.results[0].status, MatchStatus::Matched);
        assert_eq!(outcome.results[1].status, MatchStatus::TimedOut);
        assert!(outcome.degraded);
    }

    #[tokio::test]
    async fn bounding_box_is_cached_after_first_success() {
        let (engine, store) = engine(MockEmbeddingStore::new(chips()));

        let first = engine.bounding_box().await;
        let second = engine.bounding_box().await;

        assert_eq!(first, second);
        assert_eq!(first.to_array(), [37.76, -122.49, 37.81, -122.38]);
        assert_eq!(store.extent_calls(), 1);
    }

    #[tokio::test]
    async fn failed_extent_falls_back_without_caching() {
        let (engine, store) = engine(MockEmbeddingStore::new(chips()));
        store.set_extent_failing(true);

        assert_eq!(engine.bounding_box().await, DEFAULT_FALLBACK_BBOX);
        assert_eq!(engine.cache().get().await, None);

        store.set_extent_failing(false);
        assert_ne!(engine.bounding_box().await, DEFAULT_FALLBACK_BBOX);
        assert_eq!(store.extent_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_extent_query_falls_back() {
        let store = MockEmbeddingStore::new(chips()).with_extent_delay(Duration::from_secs(3600));
        let (engine, store) = engine(store);

        assert_eq!(engine.bounding_box().await, DEFAULT_FALLBACK_BBOX);
        assert_eq!(engine.cache().get().await, None);
        assert_eq!(store.extent_calls(), 1);
    }

    #[tokio::test]
    async fn batch_runs_on_spawned_task() {
        let (engine, _) = engine(MockEmbeddingStore::new(chips()));
        let points = vec![point(0, -122.44, 37.805), point(1, -122.41, 37.805)];

        let outcome = tokio::spawn(async move { engine.batch_find_similar(&points, 5).await })
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(!outcome.degraded);
    }

    #[test]
    fn join_tolerates_out_of_order_results() {
        let points = [point(0, 1.0, 1.0), point(1, 2.0, 2.0)];
        let resolved = vec![
            FeatureResult::empty(points[1].clone(), MatchStatus::TimedOut),
            FeatureResult::matched(points[0].clone(), Vec::new()),
        ];

        let joined = join_by_index(&points, resolved);
        assert_eq!(joined[0].status, MatchStatus::Matched);
        assert_eq!(joined[1].status, MatchStatus::TimedOut);
    }
}
