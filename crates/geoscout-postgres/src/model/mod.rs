//! Database models for the embeddings table.

mod embedding;

pub use embedding::{Embedding, EmbeddingChip, EmbeddingExtent, ScoredChip};
