//! States of the tool-calling loop.

use strum::IntoStaticStr;

use super::turn::ToolCallRequest;

/// Where a chat turn is in the tool-calling loop.
///
/// ```text
/// AwaitingUserInput -> ModelThinking -> (ToolDispatch -> ToolResultFolded -> ModelThinking)* -> FinalAnswer
/// ```
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ChatState {
    /// A user message arrived and has not been recorded yet.
    AwaitingUserInput(String),
    /// The model is being asked for the next step.
    ModelThinking,
    /// The model requested these calls; they run in order.
    ToolDispatch(Vec<ToolCallRequest>),
    /// Every result of the last round is in the history.
    ToolResultFolded,
    /// The model answered with text.
    FinalAnswer(String),
}

impl ChatState {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names() {
        assert_eq!(ChatState::ModelThinking.name(), "model_thinking");
        assert_eq!(ChatState::ToolDispatch(Vec::new()).name(), "tool_dispatch");
        assert_eq!(ChatState::FinalAnswer(String::new()).name(), "final_answer");
    }
}
