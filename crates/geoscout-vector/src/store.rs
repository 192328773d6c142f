//! Embedding store seam.

use async_trait::async_trait;
use geoscout_core::{BoundingBox, EmbeddingMatch};
use serde::{Deserialize, Serialize};

use crate::error::VectorResult;

/// Neighbours of the chip containing a query point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarChips {
    /// Chip whose footprint contains the point, if any.
    pub anchor: Option<String>,
    /// Other chips ranked by similarity to the anchor.
    pub matches: Vec<EmbeddingMatch>,
}

impl SimilarChips {
    /// No stored footprint contains the point.
    pub fn no_containing_chip() -> Self {
        Self::default()
    }

    /// Neighbours of the given anchor chip.
    pub fn new(anchor: impl Into<String>, matches: Vec<EmbeddingMatch>) -> Self {
        Self {
            anchor: Some(anchor.into()),
            matches,
        }
    }
}

/// Read-only access to stored imagery embeddings.
///
/// Implementations must be safe to call concurrently; each call acquires
/// and releases its own resources.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Returns the extent of every stored footprint, or `None` when empty.
    async fn extent(&self) -> VectorResult<Option<BoundingBox>>;

    /// Resolves the chip containing the point and returns at most `top_k`
    /// other chips ranked by cosine similarity to it.
    ///
    /// When several footprints contain the point the lowest chip id is the
    /// anchor.
    async fn find_similar(
        &self,
        longitude: f64,
        latitude: f64,
        top_k: usize,
    ) -> VectorResult<SimilarChips>;
}
