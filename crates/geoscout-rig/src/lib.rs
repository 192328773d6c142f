#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod chat;
mod error;
pub mod provider;
pub mod tool;

pub use error::{Error, Result};

/// Tracing target for the chat orchestrator.
pub const TRACING_TARGET_CHAT: &str = "geoscout_rig::chat";

/// Tracing target for tool dispatch.
pub const TRACING_TARGET_TOOL: &str = "geoscout_rig::tool";

/// Tracing target for language model providers.
pub const TRACING_TARGET_PROVIDER: &str = "geoscout_rig::provider";
