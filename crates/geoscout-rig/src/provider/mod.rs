//! Language model abstraction.
//!
//! The orchestrator talks to a [`LanguageModel`]: it sends the full history
//! with the tool catalog and gets back a [`ModelResponse`], a list of
//! [`ModelContent`] blocks that are either text or tool calls.
//! [`AnthropicModel`] is the production implementation on top of rig-core.

mod anthropic;
mod config;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use self::anthropic::AnthropicModel;
pub use self::config::{AnthropicConfig, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use self::scripted::{ScriptedModel, ScriptedRequest};
use crate::Result;
use crate::chat::{ConversationTurn, ToolCallRequest};
use crate::tool::ToolDefinition;

/// One model call.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    /// System preamble.
    pub preamble: Option<&'a str>,
    /// Conversation so far, oldest first; ends with a user or tool-result turn.
    pub history: &'a [ConversationTurn],
    /// Tools the model may call; empty to force a textual answer.
    pub tools: &'a [ToolDefinition],
}

impl<'a> ModelRequest<'a> {
    /// Creates a request without a preamble.
    pub fn new(history: &'a [ConversationTurn], tools: &'a [ToolDefinition]) -> Self {
        Self {
            preamble: None,
            history,
            tools,
        }
    }

    /// Sets the system preamble.
    pub fn with_preamble(mut self, preamble: &'a str) -> Self {
        self.preamble = Some(preamble).filter(|p| !p.trim().is_empty());
        self
    }
}

/// A content block of a model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelContent {
    /// Text.
    Text { text: String },
    /// A tool invocation request.
    ToolCall(ToolCallRequest),
}

impl ModelContent {
    /// Creates a text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates a tool call block.
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self::ToolCall(ToolCallRequest::new(id, name, arguments))
    }
}

/// A model response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Content blocks in the order the model produced them.
    pub content: Vec<ModelContent>,
}

impl ModelResponse {
    /// Creates a response from content blocks.
    pub fn new(content: Vec<ModelContent>) -> Self {
        Self { content }
    }

    /// Creates a text-only response.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![ModelContent::text(text)])
    }

    /// Concatenated text blocks, `None` when there are none.
    pub fn joined_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ModelContent::Text { text } => Some(text.as_str()),
                ModelContent::ToolCall(_) => None,
            })
            .collect();

        (!parts.is_empty()).then(|| parts.join(""))
    }

    /// Tool calls in request order.
    pub fn tool_calls(&self) -> Vec<ToolCallRequest> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ModelContent::ToolCall(call) => Some(call.clone()),
                ModelContent::Text { .. } => None,
            })
            .collect()
    }
}

/// A chat model with tool calling.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Name of the provider, for logs and errors.
    fn provider_name(&self) -> &str;

    /// Name of the model.
    fn model_name(&self) -> &str;

    /// Completes the conversation.
    ///
    /// # Errors
    ///
    /// [`Error::Provider`] or [`Error::Timeout`] when the provider cannot be
    /// reached; [`Error::Protocol`] when its answer cannot be interpreted.
    ///
    /// [`Error::Provider`]: crate::Error::Provider
    /// [`Error::Timeout`]: crate::Error::Timeout
    /// [`Error::Protocol`]: crate::Error::Protocol
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_and_calls_are_split() {
        let response = ModelResponse::new(vec![
            ModelContent::text("Let me look "),
            ModelContent::tool_call("toolu_1", "search_map", json!({"name": "Pier 39"})),
            ModelContent::text("that up."),
        ]);

        assert_eq!(response.joined_text().as_deref(), Some("Let me look that up."));
        assert_eq!(response.tool_calls().len(), 1);
        assert_eq!(response.tool_calls()[0].id, "toolu_1");
    }

    #[test]
    fn calls_only_have_no_text() {
        let response = ModelResponse::new(vec![ModelContent::tool_call("a", "b", json!({}))]);
        assert!(response.joined_text().is_none());
    }

    #[test]
    fn blank_preamble_is_dropped() {
        let request = ModelRequest::new(&[], &[]).with_preamble("  ");
        assert!(request.preamble.is_none());
    }
}
