#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod pgvector;

mod cache;
mod config;
mod engine;
mod error;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
mod mock;
mod store;

pub use cache::{BoundingBoxCache, DEFAULT_FALLBACK_BBOX};
pub use config::EngineConfig;
pub use engine::{BatchOutcome, SimilarityEngine};
pub use error::{VectorError, VectorResult};
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use mock::{MockChip, MockEmbeddingStore};
pub use store::{EmbeddingStore, SimilarChips};

/// Tracing target for batch similarity operations.
pub const TRACING_TARGET_ENGINE: &str = "geoscout_vector::engine";

/// Tracing target for bounding box cache operations.
pub const TRACING_TARGET_CACHE: &str = "geoscout_vector::cache";
