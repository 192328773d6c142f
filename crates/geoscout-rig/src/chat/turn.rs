//! Conversation turn types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a turn in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// User message.
    User,
    /// Assistant response, possibly requesting tools.
    Assistant,
    /// Result of one tool call.
    ToolResult,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned call id, echoed back in the result turn.
    pub id: String,
    /// Name of the tool being called.
    pub name: String,
    /// Arguments to the tool (JSON).
    pub arguments: serde_json::Value,
}

impl ToolCallRequest {
    /// Creates a new tool call request.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Content of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnContent {
    /// Plain text.
    Text { text: String },
    /// Tool calls, with any text the model emitted alongside them.
    ToolCalls {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
    /// Output of a tool call.
    ToolResult {
        call_id: String,
        content: String,
        is_error: bool,
    },
}

/// A turn in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    id: Uuid,
    role: TurnRole,
    content: TurnContent,
    created_at: Timestamp,
}

impl ConversationTurn {
    fn new(role: TurnRole, content: TurnContent) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            content,
            created_at: Timestamp::now(),
        }
    }

    /// Creates a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, TurnContent::Text { text: text.into() })
    }

    /// Creates an assistant turn carrying the final answer.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, TurnContent::Text { text: text.into() })
    }

    /// Creates an assistant turn requesting tool calls.
    pub fn tool_calls(text: Option<String>, calls: Vec<ToolCallRequest>) -> Self {
        let text = text.filter(|text| !text.is_empty());
        Self::new(TurnRole::Assistant, TurnContent::ToolCalls { text, calls })
    }

    /// Creates a tool result turn.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        Self::new(
            TurnRole::ToolResult,
            TurnContent::ToolResult {
                call_id: call_id.into(),
                content: content.into(),
                is_error,
            },
        )
    }

    /// Returns the turn ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the turn role.
    pub fn role(&self) -> TurnRole {
        self.role
    }

    /// Returns the turn content.
    pub fn content(&self) -> &TurnContent {
        &self.content
    }

    /// Returns the text of a user or assistant turn, if any.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            TurnContent::Text { text } => Some(text),
            TurnContent::ToolCalls { text, .. } => text.as_deref(),
            TurnContent::ToolResult { .. } => None,
        }
    }

    /// Returns when the turn was created.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
