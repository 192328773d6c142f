//! Embeddings repository: containment lookup, similarity ranking and extent.

use std::future::Future;

use diesel::prelude::*;
use diesel::sql_types::Double;
use diesel_async::RunQueryDsl;
use pgvector::Vector;

use crate::model::{Embedding, EmbeddingChip, EmbeddingExtent, ScoredChip};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Selects the chip whose footprint contains a WGS84 point.
///
/// The point is built in the geometry's own SRID; ties between overlapping
/// footprints resolve to the lowest chip id.
const FIND_CONTAINING_SQL: &str = "\
SELECT chips_id, vec, geom_wkt, datetime
FROM embeddings
WHERE ST_Contains(geom, ST_SetSRID(ST_MakePoint($1, $2), ST_SRID(geom)))
ORDER BY chips_id ASC
LIMIT 1";

/// Aggregate extent of every stored geometry.
const EXTENT_SQL: &str = "\
SELECT MIN(ST_YMin(geom)) AS south,
       MIN(ST_XMin(geom)) AS west,
       MAX(ST_YMax(geom)) AS north,
       MAX(ST_XMax(geom)) AS east
FROM embeddings
WHERE geom IS NOT NULL";

/// Repository for read-only embedding queries.
pub trait EmbeddingRepository {
    /// Finds the embedding whose geometry contains the point, if any.
    fn find_containing_embedding(
        &mut self,
        longitude: f64,
        latitude: f64,
    ) -> impl Future<Output = PgResult<Option<Embedding>>> + Send;

    /// Ranks every embedding except `anchor_id` by cosine similarity to
    /// `anchor`, most similar first, ties broken by chip id.
    fn rank_similar_embeddings(
        &mut self,
        anchor_id: &str,
        anchor: &Vector,
        limit: i64,
    ) -> impl Future<Output = PgResult<Vec<ScoredChip>>> + Send;

    /// Computes the spatial extent of all stored geometries.
    fn embedding_extent(&mut self) -> impl Future<Output = PgResult<EmbeddingExtent>> + Send;
}

impl EmbeddingRepository for PgConnection {
    async fn find_containing_embedding(
        &mut self,
        longitude: f64,
        latitude: f64,
    ) -> PgResult<Option<Embedding>> {
        let embedding = diesel::sql_query(FIND_CONTAINING_SQL)
            .bind::<Double, _>(longitude)
            .bind::<Double, _>(latitude)
            .get_result::<Embedding>(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        tracing::trace!(
            target: TRACING_TARGET_QUERY,
            longitude,
            latitude,
            chip_id = embedding.as_ref().map(|e| e.chips_id.as_str()),
            "Resolved containing embedding"
        );

        Ok(embedding)
    }

    async fn rank_similar_embeddings(
        &mut self,
        anchor_id: &str,
        anchor: &Vector,
        limit: i64,
    ) -> PgResult<Vec<ScoredChip>> {
        use pgvector::VectorExpressionMethods;
        use schema::embeddings::{self, dsl};

        let rows: Vec<(EmbeddingChip, f64)> = embeddings::table
            .filter(dsl::chips_id.ne(anchor_id))
            .order((dsl::vec.cosine_distance(anchor), dsl::chips_id.asc()))
            .limit(limit)
            .select((
                EmbeddingChip::as_select(),
                1.0.into_sql::<Double>() - dsl::vec.cosine_distance(anchor),
            ))
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows
            .into_iter()
            .map(|(chip, score)| ScoredChip { chip, score })
            .collect())
    }

    async fn embedding_extent(&mut self) -> PgResult<EmbeddingExtent> {
        diesel::sql_query(EXTENT_SQL)
            .get_result::<EmbeddingExtent>(self)
            .await
            .map_err(PgError::from)
    }
}
