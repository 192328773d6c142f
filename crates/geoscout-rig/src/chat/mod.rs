//! Tool-calling chat orchestration.
//!
//! A [`ChatSession`] owns the conversation history. For every user message
//! it asks the model for the next step, runs the tool calls the model
//! requests through a [`ToolProvider`], folds the results back into the
//! history and repeats until the model answers with text. Structured tool
//! output is returned alongside the answer as a [`ToolPayload`].
//!
//! [`ToolProvider`]: crate::tool::ToolProvider

mod config;
mod response;
mod session;
mod state;
mod turn;

pub use config::{ChatConfig, DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_PREAMBLE};
pub use response::{ChatResponse, ToolFailure, ToolPayload};
pub use session::ChatSession;
pub use state::ChatState;
pub use turn::{ConversationTurn, ToolCallRequest, TurnContent, TurnRole};
