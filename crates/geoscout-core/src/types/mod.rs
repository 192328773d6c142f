//! Geographic value types and similarity search results.

mod bbox;
mod feature;
mod matches;

pub use bbox::BoundingBox;
pub use feature::{ElementKind, FeaturePoint};
pub use matches::{EmbeddingMatch, FeatureResult, MatchStatus};
