//! Anthropic model adapter on top of rig-core.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionModel as _};
use rig::message::{Message, ToolResultContent, UserContent};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::anthropic;

use super::{AnthropicConfig, LanguageModel, ModelContent, ModelRequest, ModelResponse};
use crate::chat::{ConversationTurn, TurnContent, TurnRole};
use crate::tool::ToolDefinition;
use crate::{Error, Result, TRACING_TARGET_PROVIDER};

const PROVIDER: &str = "anthropic";

/// Claude models through the Anthropic Messages API.
///
/// This is a cheaply cloneable wrapper around an `Arc`.
#[derive(Clone)]
pub struct AnthropicModel {
    inner: Arc<AnthropicModelInner>,
}

struct AnthropicModelInner {
    model: anthropic::completion::CompletionModel,
    config: AnthropicConfig,
}

impl std::fmt::Debug for AnthropicModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicModel")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AnthropicModel {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        config.validate()?;

        let client = anthropic::Client::new(&config.anthropic_api_key)
            .map_err(|e| Error::provider(PROVIDER, e))?;
        let model = client.completion_model(&config.anthropic_model);

        tracing::debug!(
            target: TRACING_TARGET_PROVIDER,
            model = %config.anthropic_model,
            max_tokens = config.anthropic_max_tokens,
            "Created Anthropic model"
        );

        Ok(Self {
            inner: Arc::new(AnthropicModelInner { model, config }),
        })
    }

    /// Gets the model configuration.
    pub fn config(&self) -> &AnthropicConfig {
        &self.inner.config
    }
}

#[async_trait]
impl LanguageModel for AnthropicModel {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        &self.inner.config.anthropic_model
    }

    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse> {
        let mut messages = to_messages(request.history)?;
        let Some(prompt) = messages.pop() else {
            return Err(Error::protocol("cannot complete an empty conversation"));
        };

        let mut builder = self
            .inner
            .model
            .completion_request(prompt)
            .messages(messages)
            .max_tokens(self.inner.config.anthropic_max_tokens);

        if let Some(preamble) = request.preamble {
            builder = builder.preamble(preamble.to_string());
        }
        if !request.tools.is_empty() {
            builder = builder.tools(request.tools.iter().map(to_rig_tool).collect());
        }

        let started = Instant::now();
        let deadline = self.inner.config.timeout();
        let response = match tokio::time::timeout(deadline, builder.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(
                    target: TRACING_TARGET_PROVIDER,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Anthropic completion failed"
                );
                return Err(Error::provider(PROVIDER, e));
            }
            Err(_) => {
                tracing::error!(
                    target: TRACING_TARGET_PROVIDER,
                    timeout_secs = deadline.as_secs(),
                    "Anthropic completion timed out"
                );
                return Err(Error::timeout(PROVIDER, deadline));
            }
        };

        let content: Vec<ModelContent> = response
            .choice
            .into_iter()
            .filter_map(|block| match block {
                AssistantContent::Text(text) => Some(ModelContent::text(text.text)),
                AssistantContent::ToolCall(call) => Some(ModelContent::tool_call(
                    call.id,
                    call.function.name,
                    call.function.arguments,
                )),
                _ => None,
            })
            .collect();

        tracing::debug!(
            target: TRACING_TARGET_PROVIDER,
            blocks = content.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Anthropic completion received"
        );

        if content.is_empty() {
            return Err(Error::protocol("model returned neither text nor tool calls"));
        }

        Ok(ModelResponse::new(content))
    }
}

fn to_rig_tool(tool: &ToolDefinition) -> rig::completion::ToolDefinition {
    rig::completion::ToolDefinition {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: tool.input_schema.clone(),
    }
}

/// Maps turns onto Anthropic messages.
///
/// Consecutive tool-result turns are merged into one user message, which is
/// where the Messages API expects the results of one assistant turn.
fn to_messages(history: &[ConversationTurn]) -> Result<Vec<Message>> {
    let mut messages = Vec::with_capacity(history.len());
    let mut pending_results: Vec<UserContent> = Vec::new();

    for turn in history {
        if let TurnContent::ToolResult {
            call_id,
            content,
            is_error,
        } = turn.content()
        {
            let content = if *is_error {
                format!("Error: {content}")
            } else {
                content.clone()
            };
            pending_results.push(UserContent::tool_result(
                call_id.clone(),
                OneOrMany::one(ToolResultContent::text(content)),
            ));
            continue;
        }

        flush_results(&mut messages, &mut pending_results)?;

        match turn.content() {
            TurnContent::Text { text } if turn.role() == TurnRole::User => {
                messages.push(Message::User {
                    content: OneOrMany::one(UserContent::text(text.clone())),
                });
            }
            TurnContent::Text { text } => {
                messages.push(Message::Assistant {
                    id: None,
                    content: OneOrMany::one(AssistantContent::text(text.clone())),
                });
            }
            TurnContent::ToolCalls { text, calls } => {
                let blocks: Vec<AssistantContent> = text
                    .iter()
                    .map(|text| AssistantContent::text(text.clone()))
                    .chain(calls.iter().map(|call| {
                        AssistantContent::tool_call(
                            call.id.clone(),
                            call.name.clone(),
                            call.arguments.clone(),
                        )
                    }))
                    .collect();
                let content = OneOrMany::many(blocks)
                    .map_err(|_| Error::protocol("assistant turn without content"))?;
                messages.push(Message::Assistant { id: None, content });
            }
            TurnContent::ToolResult { .. } => {}
        }
    }

    flush_results(&mut messages, &mut pending_results)?;
    Ok(messages)
}

fn flush_results(messages: &mut Vec<Message>, pending: &mut Vec<UserContent>) -> Result<()> {
    if pending.is_empty() {
        return Ok(());
    }

    let content = OneOrMany::many(std::mem::take(pending))
        .map_err(|_| Error::protocol("tool results without content"))?;
    messages.push(Message::User { content });
    Ok(())
}
