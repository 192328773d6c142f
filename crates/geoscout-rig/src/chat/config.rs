//! Chat session configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default number of tool rounds before a textual answer is forced.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 4;

/// Default system preamble.
pub const DEFAULT_PREAMBLE: &str = "\
You are a geospatial research assistant for the San Francisco Bay Area. \
Use the search_map tool to find OpenStreetMap features by name or OSM tags \
and to retrieve imagery chips that look similar to each feature. Prefer tags \
for feature types. Answer in concise, well formatted markdown: list each \
feature with its name and coordinates, followed by its most similar chips \
with chip id, similarity, geometry and capture time. If a search fails or \
finds nothing, say so plainly instead of guessing.";

/// Configuration of the tool-calling loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ChatConfig {
    /// Tool rounds allowed per user message.
    #[cfg_attr(
        feature = "config",
        arg(long = "chat-max-tool-rounds", env = "CHAT_MAX_TOOL_ROUNDS", default_value = "4")
    )]
    pub max_tool_rounds: usize,

    /// System preamble sent with every model call.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "chat-preamble",
            env = "CHAT_PREAMBLE",
            default_value = DEFAULT_PREAMBLE,
            hide_default_value = true
        )
    )]
    pub preamble: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            preamble: DEFAULT_PREAMBLE.to_string(),
        }
    }
}

impl ChatConfig {
    /// Sets the tool round limit.
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Sets the system preamble.
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(1..=16).contains(&self.max_tool_rounds) {
            return Err(Error::config(format!(
                "max tool rounds must be between 1 and 16, got {}",
                self.max_tool_rounds
            )));
        }
        Ok(())
    }
}
