//! Similarity search results.

use std::cmp::Ordering;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::FeaturePoint;

/// One ranked neighbour of a query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatch {
    /// Identifier of the imagery chip backing the embedding.
    pub chip_id: String,
    /// Cosine similarity to the containing chip, clamped to `[0, 1]`.
    pub similarity: f64,
    /// Chip footprint in Well-Known Text.
    pub geometry_wkt: String,
    /// When the imagery was captured.
    pub captured_at: Timestamp,
}

impl EmbeddingMatch {
    /// Creates a match, clamping the similarity into `[0, 1]`.
    pub fn new(
        chip_id: impl Into<String>,
        similarity: f64,
        geometry_wkt: impl Into<String>,
        captured_at: Timestamp,
    ) -> Self {
        let similarity = if similarity.is_nan() {
            0.0
        } else {
            similarity.clamp(0.0, 1.0)
        };

        Self {
            chip_id: chip_id.into(),
            similarity,
            geometry_wkt: geometry_wkt.into(),
            captured_at,
        }
    }

    /// Ranking order: similarity descending, then chip id ascending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .similarity
            .total_cmp(&self.similarity)
            .then_with(|| self.chip_id.cmp(&other.chip_id))
    }
}

/// Outcome of the similarity search for a single feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum MatchStatus {
    /// A containing chip was found and its neighbours ranked.
    Matched,
    /// No stored geometry contains the feature location.
    NoContainingChip,
    /// The per-point query failed.
    Failed(String),
    /// The per-point query exceeded its deadline.
    TimedOut,
}

impl MatchStatus {
    /// Returns whether this outcome reflects a failure rather than an answer.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::TimedOut)
    }
}

/// A feature together with its ranked embedding neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureResult {
    /// The originating feature.
    pub feature: FeaturePoint,
    /// Ranked neighbours, most similar first.
    pub matches: Vec<EmbeddingMatch>,
    /// How the search for this feature ended.
    #[serde(flatten)]
    pub status: MatchStatus,
}

impl FeatureResult {
    /// Creates a result with ranked matches.
    pub fn matched(feature: FeaturePoint, matches: Vec<EmbeddingMatch>) -> Self {
        Self {
            feature,
            matches,
            status: MatchStatus::Matched,
        }
    }

    /// Creates a result with no matches and the given status.
    pub fn empty(feature: FeaturePoint, status: MatchStatus) -> Self {
        Self {
            feature,
            matches: Vec::new(),
            status,
        }
    }
}
