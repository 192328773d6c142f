//! Database query repositories.
//!
//! Repositories are traits implemented for [`PgConnection`], so they are
//! available on any pooled [`PgConn`] through deref.
//!
//! [`PgConnection`]: crate::PgConnection
//! [`PgConn`]: crate::PgConn

mod embedding;

pub use embedding::EmbeddingRepository;
