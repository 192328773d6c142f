//! Tool protocol between the chat orchestrator and the search services.
//!
//! The orchestrator only sees a [`ToolProvider`]: a catalog of
//! [`ToolDefinition`]s and a `call_tool` entry point returning a
//! [`CallToolResult`]. [`ToolRegistry`] is the in-process provider; the
//! composite [`SearchMapTool`] is registered in it.
//!
//! ## Failures
//!
//! `call_tool` returns `Err` for protocol-level problems (unknown tool,
//! arguments that do not match the schema) and for service failures
//! (invalid filter, unreachable upstream). Tools may also report a soft
//! failure as an `Ok` result with `is_error` set. The orchestrator folds
//! both into an error tool-result turn.

mod registry;
mod search_map;

use async_trait::async_trait;
pub use registry::ToolRegistry;
pub use search_map::{SEARCH_MAP_TOOL, SearchMapArgs, SearchMapOutput, SearchMapTool};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Schema and description of a tool, as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// What the tool does and when to use it.
    pub description: String,
    /// JSON Schema of the tool arguments.
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Output of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Text handed back to the model.
    pub content: String,
    /// Machine-readable output, surfaced to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<serde_json::Value>,
    /// Whether the call failed.
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Creates a successful result; the content is the serialized value.
    pub fn structured(value: serde_json::Value) -> Self {
        Self {
            content: value.to_string(),
            structured_content: Some(value),
            is_error: false,
        }
    }

    /// Creates a successful text-only result.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            structured_content: None,
            is_error: false,
        }
    }

    /// Creates a failed result.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            structured_content: None,
            is_error: true,
        }
    }
}

/// A single callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's definition.
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with JSON arguments.
    async fn call(&self, arguments: serde_json::Value) -> Result<CallToolResult>;
}

/// Catalog and dispatcher of tools offered to the model.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Lists every available tool.
    fn list_tools(&self) -> Vec<ToolDefinition>;

    /// Calls a tool by name.
    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<CallToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_result_serializes_content() {
        let result = CallToolResult::structured(serde_json::json!({"features": []}));
        assert!(!result.is_error);
        assert_eq!(result.content, r#"{"features":[]}"#);
    }

    #[test]
    fn result_wire_names() {
        let json = serde_json::to_value(CallToolResult::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"content": "boom", "isError": true}));
    }
}
