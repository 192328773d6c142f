//! Embedding models for PostgreSQL database operations.

use diesel::prelude::*;
use diesel::sql_types::{Double, Nullable};
use geoscout_core::{BoundingBox, EmbeddingMatch};
use jiff_diesel::Timestamp;
use pgvector::Vector;

use crate::schema::embeddings;

/// A stored imagery chip with its embedding vector.
///
/// Loaded only for the anchor chip of a lookup; ranking queries select
/// [`EmbeddingChip`] instead to avoid shipping vectors back.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = embeddings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Embedding {
    /// Chip identifier.
    pub chips_id: String,
    /// Embedding vector.
    pub vec: Vector,
    /// Chip footprint in Well-Known Text.
    pub geom_wkt: String,
    /// Imagery capture time.
    pub datetime: Timestamp,
}

impl Embedding {
    /// Returns the embedding dimensions.
    pub fn dimensions(&self) -> usize {
        self.vec.as_slice().len()
    }
}

/// Chip metadata without the vector.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = embeddings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmbeddingChip {
    /// Chip identifier.
    pub chips_id: String,
    /// Chip footprint in Well-Known Text.
    pub geom_wkt: String,
    /// Imagery capture time.
    pub datetime: Timestamp,
}

/// A chip with its cosine similarity to an anchor embedding.
#[derive(Debug, Clone)]
pub struct ScoredChip {
    /// The ranked chip.
    pub chip: EmbeddingChip,
    /// `1 - cosine_distance`; may fall outside `[0, 1]` for opposed vectors.
    pub score: f64,
}

impl From<ScoredChip> for EmbeddingMatch {
    fn from(scored: ScoredChip) -> Self {
        EmbeddingMatch::new(
            scored.chip.chips_id,
            scored.score,
            scored.chip.geom_wkt,
            scored.chip.datetime.into(),
        )
    }
}

/// Aggregate extent of all stored geometries.
///
/// Every field is `NULL` when the table is empty.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub struct EmbeddingExtent {
    /// Minimum latitude.
    #[diesel(sql_type = Nullable<Double>)]
    pub south: Option<f64>,
    /// Minimum longitude.
    #[diesel(sql_type = Nullable<Double>)]
    pub west: Option<f64>,
    /// Maximum latitude.
    #[diesel(sql_type = Nullable<Double>)]
    pub north: Option<f64>,
    /// Maximum longitude.
    #[diesel(sql_type = Nullable<Double>)]
    pub east: Option<f64>,
}

impl EmbeddingExtent {
    /// Returns the extent as a validated bounding box, if the table has rows
    /// and the geometries are in a geographic coordinate system.
    pub fn to_bounding_box(&self) -> Option<BoundingBox> {
        let (south, west, north, east) = (self.south?, self.west?, self.north?, self.east?);
        BoundingBox::try_new(south, west, north, east).ok()
    }
}
