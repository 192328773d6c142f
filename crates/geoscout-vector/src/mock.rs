//! In-memory embedding store for tests.
//!
//! Footprints are axis-aligned boxes and similarity is computed in process,
//! so engine and orchestrator behaviour can be exercised without PostGIS.
//!
//! ```rust,ignore
//! use geoscout_vector::{MockChip, MockEmbeddingStore};
//!
//! let store = MockEmbeddingStore::new(vec![
//!     MockChip::new("chip-a", BoundingBox::new(37.79, -122.45, 37.81, -122.43), vec![1.0, 0.0]),
//!     MockChip::new("chip-b", BoundingBox::new(37.70, -122.50, 37.72, -122.48), vec![0.9, 0.1]),
//! ]);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use geoscout_core::{BoundingBox, EmbeddingMatch};
use jiff::Timestamp;

use crate::error::{VectorError, VectorResult};
use crate::store::{EmbeddingStore, SimilarChips};

/// A stored chip of the mock store.
#[derive(Debug, Clone)]
pub struct MockChip {
    /// Chip identifier.
    pub chip_id: String,
    /// Rectangular footprint.
    pub footprint: BoundingBox,
    /// Embedding vector.
    pub vector: Vec<f32>,
    /// Capture time.
    pub captured_at: Timestamp,
}

impl MockChip {
    /// Creates a chip captured at the Unix epoch.
    pub fn new(chip_id: impl Into<String>, footprint: BoundingBox, vector: Vec<f32>) -> Self {
        Self {
            chip_id: chip_id.into(),
            footprint,
            vector,
            captured_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn wkt(&self) -> String {
        let BoundingBox {
            south,
            west,
            north,
            east,
        } = self.footprint;
        format!(
            "POLYGON(({west} {south}, {east} {south}, {east} {north}, {west} {north}, {west} {south}))"
        )
    }
}

/// Point key with bit-exact coordinates.
type PointKey = (u64, u64);

fn point_key(longitude: f64, latitude: f64) -> PointKey {
    (longitude.to_bits(), latitude.to_bits())
}

/// In-memory [`EmbeddingStore`].
#[derive(Debug, Default)]
pub struct MockEmbeddingStore {
    chips: Vec<MockChip>,
    failures: HashMap<PointKey, String>,
    delays: HashMap<PointKey, Duration>,
    extent_delay: Option<Duration>,
    include_anchor: bool,
    extent_fails: AtomicBool,
    extent_calls: AtomicUsize,
    lookups: AtomicUsize,
}

impl MockEmbeddingStore {
    /// Creates a store holding the given chips.
    pub fn new(chips: Vec<MockChip>) -> Self {
        Self {
            chips,
            ..Self::default()
        }
    }

    /// Makes lookups at exactly this point fail.
    pub fn with_failure_at(mut self, longitude: f64, latitude: f64, reason: impl Into<String>) -> Self {
        self.failures
            .insert(point_key(longitude, latitude), reason.into());
        self
    }

    /// Delays lookups at exactly this point.
    pub fn with_delay_at(mut self, longitude: f64, latitude: f64, delay: Duration) -> Self {
        self.delays.insert(point_key(longitude, latitude), delay);
        self
    }

    /// Delays every extent query.
    pub fn with_extent_delay(mut self, delay: Duration) -> Self {
        self.extent_delay = Some(delay);
        self
    }

    /// Leaks the anchor chip into its own ranking, like a misbehaving backend.
    pub fn with_anchor_in_results(mut self) -> Self {
        self.include_anchor = true;
        self
    }

    /// Makes extent queries fail until cleared.
    pub fn set_extent_failing(&self, failing: bool) {
        self.extent_fails.store(failing, Ordering::SeqCst);
    }

    /// Number of extent queries served.
    pub fn extent_calls(&self) -> usize {
        self.extent_calls.load(Ordering::SeqCst)
    }

    /// Number of similarity lookups served.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn anchor_at(&self, longitude: f64, latitude: f64) -> Option<&MockChip> {
        self.chips
            .iter()
            .filter(|chip| chip.footprint.contains(longitude, latitude))
            .min_by(|a, b| a.chip_id.cmp(&b.chip_id))
    }
}

/// Cosine similarity, `0.0` when either vector has zero norm.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl EmbeddingStore for MockEmbeddingStore {
    async fn extent(&self) -> VectorResult<Option<BoundingBox>> {
        self.extent_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.extent_delay {
            tokio::time::sleep(delay).await;
        }

        if self.extent_fails.load(Ordering::SeqCst) {
            return Err(VectorError::query("extent query failed"));
        }

        Ok(self.chips.iter().map(|chip| chip.footprint).reduce(|a, b| {
            BoundingBox::new(
                a.south.min(b.south),
                a.west.min(b.west),
                a.north.max(b.north),
                a.east.max(b.east),
            )
        }))
    }

    async fn find_similar(
        &self,
        longitude: f64,
        latitude: f64,
        top_k: usize,
    ) -> VectorResult<SimilarChips> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let key = point_key(longitude, latitude);

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(reason) = self.failures.get(&key) {
            return Err(VectorError::query(reason.clone()));
        }

        let Some(anchor) = self.anchor_at(longitude, latitude) else {
            return Ok(SimilarChips::no_containing_chip());
        };

        let mut matches: Vec<EmbeddingMatch> = self
            .chips
            .iter()
            .filter(|chip| self.include_anchor || chip.chip_id != anchor.chip_id)
            .map(|chip| {
                EmbeddingMatch::new(
                    chip.chip_id.clone(),
                    cosine_similarity(&anchor.vector, &chip.vector),
                    chip.wkt(),
                    chip.captured_at,
                )
            })
            .collect();

        matches.sort_by(EmbeddingMatch::rank_cmp);
        matches.truncate(top_k);

        Ok(SimilarChips::new(anchor.chip_id.clone(), matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MockEmbeddingStore {
        MockEmbeddingStore::new(vec![
            MockChip::new("b", BoundingBox::new(0.0, 0.0, 2.0, 2.0), vec![1.0, 0.0]),
            MockChip::new("a", BoundingBox::new(1.0, 1.0, 3.0, 3.0), vec![0.0, 1.0]),
            MockChip::new("c", BoundingBox::new(10.0, 10.0, 11.0, 11.0), vec![1.0, 1.0]),
        ])
    }

    #[tokio::test]
    async fn overlapping_footprints_resolve_to_lowest_id() {
        let similar = store().find_similar(1.5, 1.5, 5).await.unwrap();
        assert_eq!(similar.anchor.as_deref(), Some("a"));
        assert!(similar.matches.iter().all(|m| m.chip_id != "a"));
    }

    #[tokio::test]
    async fn extent_is_union_of_footprints() {
        let extent = store().extent().await.unwrap().unwrap();
        assert_eq!(extent.to_array(), [0.0, 0.0, 11.0, 11.0]);
        assert!(MockEmbeddingStore::default().extent().await.unwrap().is_none());
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-9);
    }
}
