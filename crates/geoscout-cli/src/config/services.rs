//! Service construction from CLI configuration.

use std::sync::Arc;

use anyhow::Context;
use geoscout_overpass::OverpassClient;
use geoscout_postgres::PgClient;
use geoscout_rig::chat::ChatSession;
use geoscout_rig::provider::AnthropicModel;
use geoscout_rig::tool::{SearchMapTool, ToolRegistry};
use geoscout_vector::pgvector::PgEmbeddingStore;
use geoscout_vector::{BoundingBoxCache, SimilarityEngine};

use super::Cli;
use crate::TRACING_TARGET_STARTUP;

/// Creates a chat session wired to Overpass, the embeddings database and
/// the Anthropic model.
///
/// # Errors
///
/// Returns an error if any client cannot be created or the database is
/// unreachable.
pub async fn create_session(cli: &Cli) -> anyhow::Result<ChatSession> {
    let overpass =
        OverpassClient::new(cli.overpass.clone()).context("failed to create Overpass client")?;

    let pg_client = PgClient::new_with_test(cli.postgres.clone())
        .await
        .context("failed to connect to the embeddings database")?;

    let engine = SimilarityEngine::new(
        Arc::new(PgEmbeddingStore::new(pg_client)),
        Arc::new(BoundingBoxCache::new()),
        cli.engine.clone(),
    )
    .context("failed to create similarity engine")?;

    let tools = ToolRegistry::new().with_tool(SearchMapTool::new(overpass, engine));

    let model =
        AnthropicModel::new(cli.anthropic.clone()).context("failed to create Anthropic model")?;

    let session = ChatSession::new(Arc::new(model), Arc::new(tools), cli.chat.clone())
        .context("failed to create chat session")?;

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        session = %session.id(),
        "Chat session ready"
    );

    Ok(session)
}
