//! PostgreSQL + PostGIS + pgvector embedding store.

mod backend;

pub use backend::PgEmbeddingStore;
