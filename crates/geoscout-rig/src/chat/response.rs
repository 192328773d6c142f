//! Chat response types.

use geoscout_core::FeatureResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::{CallToolResult, SEARCH_MAP_TOOL, SearchMapOutput};

/// A tool call that failed during a chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    /// Name of the tool.
    pub tool: String,
    /// Call id assigned by the model.
    pub call_id: String,
    /// Error message.
    pub message: String,
}

/// Structured results accumulated from every tool call of a chat turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolPayload {
    /// Features from every successful map search, in call order.
    pub features: Vec<FeatureResult>,
    /// Set when any similarity lookup failed or timed out.
    pub degraded: bool,
    /// Failed tool calls.
    pub errors: Vec<ToolFailure>,
}

impl ToolPayload {
    /// Folds a successful tool result in.
    ///
    /// Structured output of other tools is ignored. A `search_map` result
    /// that does not decode is recorded as a failure so missing features are
    /// never silent.
    pub(crate) fn absorb(&mut self, tool: &str, call_id: &str, result: &CallToolResult) {
        if tool != SEARCH_MAP_TOOL {
            return;
        }

        let decoded = result
            .structured_content
            .as_ref()
            .ok_or_else(|| "missing structured content".to_string())
            .and_then(|structured| {
                SearchMapOutput::deserialize(structured).map_err(|err| err.to_string())
            });

        match decoded {
            Ok(output) => {
                self.degraded |= output.degraded;
                self.features.extend(output.features);
            }
            Err(message) => {
                let message = format!("undecodable {tool} result: {message}");
                self.record_failure(tool, call_id, message);
            }
        }
    }

    /// Records a failed tool call.
    pub(crate) fn record_failure(
        &mut self,
        tool: impl Into<String>,
        call_id: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(ToolFailure {
            tool: tool.into(),
            call_id: call_id.into(),
            message: message.into(),
        });
    }

    /// Returns whether the caller should treat the answer as partial.
    pub fn is_partial(&self) -> bool {
        self.degraded || !self.errors.is_empty()
    }
}

/// Final answer of one chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Id of the assistant turn holding the answer.
    pub id: Uuid,
    /// Final answer text.
    pub text: String,
    /// Structured tool results.
    pub payload: ToolPayload,
    /// Number of tool rounds used.
    pub rounds: usize,
}
