#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;
mod filter;
pub mod query;
mod response;

pub use crate::client::OverpassClient;
pub use crate::config::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, OverpassConfig};
pub use crate::error::{Error, Result};
pub use crate::filter::{DEFAULT_RESULT_LIMIT, SearchFilter, TagFilter, WILDCARD};
pub use crate::response::{OverpassElement, OverpassResponse};

/// Tracing target for Overpass client operations.
pub const TRACING_TARGET_CLIENT: &str = "geoscout_overpass::client";

/// Tracing target for query compilation.
pub const TRACING_TARGET_QUERY: &str = "geoscout_overpass::query";
