//! Tool registry for managing available tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{CallToolResult, Tool, ToolDefinition, ToolProvider};
use crate::{Error, Result, TRACING_TARGET_TOOL};

/// Registry of available tools, listed in name order.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its definition's name, replacing any tool
    /// with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) -> &mut Self {
        let name = tool.definition().name;
        self.tools.insert(name, Arc::new(tool));
        self
    }

    /// Registers a tool, builder style.
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    /// Returns whether a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolProvider for ToolRegistry {
    fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    #[tracing::instrument(skip(self, arguments), target = TRACING_TARGET_TOOL)]
    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<CallToolResult> {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(target: TRACING_TARGET_TOOL, tool = name, "Model requested an unknown tool");
            return Err(Error::UnknownTool(name.to_string()));
        };

        tool.call(arguments).await
    }
}
