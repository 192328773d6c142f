//! pgvector backend implementation.

use async_trait::async_trait;
use geoscout_core::{BoundingBox, EmbeddingMatch};
use geoscout_postgres::PgClient;
use geoscout_postgres::query::EmbeddingRepository;

use crate::TRACING_TARGET_ENGINE;
use crate::error::VectorResult;
use crate::store::{EmbeddingStore, SimilarChips};

/// Embedding store backed by the `embeddings` table.
///
/// Each lookup acquires its own pooled connection, which returns to the pool
/// when the lookup completes, fails or is cancelled by a timeout.
#[derive(Debug, Clone)]
pub struct PgEmbeddingStore {
    client: PgClient,
}

impl PgEmbeddingStore {
    /// Creates a store over the given client.
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }

    /// Gets the underlying database client.
    pub fn client(&self) -> &PgClient {
        &self.client
    }
}

#[async_trait]
impl EmbeddingStore for PgEmbeddingStore {
    async fn extent(&self) -> VectorResult<Option<BoundingBox>> {
        let mut conn = self.client.get_connection().await?;
        let extent = conn.embedding_extent().await?;
        let bbox = extent.to_bounding_box();

        if bbox.is_none() && extent.south.is_some() {
            tracing::warn!(
                target: TRACING_TARGET_ENGINE,
                ?extent,
                "Embeddings extent is not a valid WGS84 bounding box"
            );
        }

        Ok(bbox)
    }

    async fn find_similar(
        &self,
        longitude: f64,
        latitude: f64,
        top_k: usize,
    ) -> VectorResult<SimilarChips> {
        let mut conn = self.client.get_connection().await?;

        let Some(anchor) = conn.find_containing_embedding(longitude, latitude).await? else {
            return Ok(SimilarChips::no_containing_chip());
        };

        let limit = i64::try_from(top_k).unwrap_or(i64::MAX);
        let ranked = conn
            .rank_similar_embeddings(&anchor.chips_id, &anchor.vec, limit)
            .await?;

        tracing::debug!(
            target: TRACING_TARGET_ENGINE,
            anchor = %anchor.chips_id,
            dimensions = anchor.dimensions(),
            matches = ranked.len(),
            "Ranked similar embeddings"
        );

        let matches = ranked.into_iter().map(EmbeddingMatch::from).collect();
        Ok(SimilarChips::new(anchor.chips_id, matches))
    }
}
