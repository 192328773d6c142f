//! Chat session: owns the history and drives the tool-calling loop.

use std::sync::Arc;

use uuid::Uuid;

use super::config::ChatConfig;
use super::response::{ChatResponse, ToolPayload};
use super::state::ChatState;
use super::turn::{ConversationTurn, ToolCallRequest};
use crate::provider::{LanguageModel, ModelRequest};
use crate::tool::{ToolDefinition, ToolProvider};
use crate::{Error, Result, TRACING_TARGET_CHAT};

/// One conversation with a language model and its tools.
///
/// The history is append-only and owned by the session; model calls and
/// tool calls are strictly sequential. Use one session per conversation.
pub struct ChatSession {
    id: Uuid,
    model: Arc<dyn LanguageModel>,
    tools: Arc<dyn ToolProvider>,
    config: ChatConfig,
    history: Vec<ConversationTurn>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("model", &self.model.model_name())
            .field("turns", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Creates an empty session.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        tools: Arc<dyn ToolProvider>,
        config: ChatConfig,
    ) -> Result<Self> {
        config.validate()?;

        let id = Uuid::now_v7();
        tracing::debug!(
            target: TRACING_TARGET_CHAT,
            session = %id,
            provider = model.provider_name(),
            model = model.model_name(),
            "Chat session created"
        );

        Ok(Self {
            id,
            model,
            tools,
            config,
            history: Vec::new(),
        })
    }

    /// Returns the session ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the conversation so far, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Answers a user message, calling tools as the model requests.
    ///
    /// Tool failures do not fail the call: they are reported to the model as
    /// error results and listed in the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be reached, or keeps requesting
    /// tools once the round limit is exhausted. The user turn stays in the
    /// history either way.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_CHAT, fields(session = %self.id))]
    pub async fn send(&mut self, message: impl Into<String>) -> Result<ChatResponse> {
        let catalog = self.tools.list_tools();
        let max_rounds = self.config.max_tool_rounds;
        let mut payload = ToolPayload::default();
        let mut rounds = 0;
        let mut state = ChatState::AwaitingUserInput(message.into());

        loop {
            tracing::trace!(target: TRACING_TARGET_CHAT, state = state.name(), rounds, "Chat state");

            state = match state {
                ChatState::AwaitingUserInput(text) => {
                    self.history.push(ConversationTurn::user(text));
                    ChatState::ModelThinking
                }
                ChatState::ModelThinking => {
                    let tools_enabled = rounds < max_rounds;
                    let tools: &[ToolDefinition] = if tools_enabled { &catalog } else { &[] };
                    if !tools_enabled {
                        tracing::info!(
                            target: TRACING_TARGET_CHAT,
                            rounds,
                            "Tool round limit reached, asking for a final answer"
                        );
                    }

                    let request =
                        ModelRequest::new(&self.history, tools).with_preamble(&self.config.preamble);
                    let response = self.model.complete(request).await.inspect_err(|e| {
                        tracing::error!(target: TRACING_TARGET_CHAT, error = %e, "Model call failed");
                    })?;

                    let calls = response.tool_calls();
                    let text = response.joined_text();

                    if calls.is_empty() {
                        ChatState::FinalAnswer(text.unwrap_or_default())
                    } else if !tools_enabled {
                        return Err(Error::protocol(format!(
                            "model requested {} tool call(s) after the limit of {max_rounds} rounds",
                            calls.len()
                        )));
                    } else {
                        self.history
                            .push(ConversationTurn::tool_calls(text, calls.clone()));
                        ChatState::ToolDispatch(calls)
                    }
                }
                ChatState::ToolDispatch(calls) => {
                    rounds += 1;
                    for call in &calls {
                        let turn = self.dispatch(call, &mut payload).await;
                        self.history.push(turn);
                    }
                    ChatState::ToolResultFolded
                }
                ChatState::ToolResultFolded => ChatState::ModelThinking,
                ChatState::FinalAnswer(text) => {
                    let turn = ConversationTurn::assistant(text.clone());
                    let id = turn.id();
                    self.history.push(turn);

                    tracing::info!(
                        target: TRACING_TARGET_CHAT,
                        rounds,
                        features = payload.features.len(),
                        tool_errors = payload.errors.len(),
                        degraded = payload.degraded,
                        "Chat turn answered"
                    );

                    return Ok(ChatResponse {
                        id,
                        text,
                        payload,
                        rounds,
                    });
                }
            };
        }
    }

    /// Runs one tool call and turns its outcome into a tool-result turn.
    async fn dispatch(&self, call: &ToolCallRequest, payload: &mut ToolPayload) -> ConversationTurn {
        tracing::debug!(
            target: TRACING_TARGET_CHAT,
            tool = %call.name,
            call_id = %call.id,
            "Dispatching tool call"
        );

        match self.tools.call_tool(&call.name, call.arguments.clone()).await {
            Ok(result) if !result.is_error => {
                payload.absorb(&call.name, &call.id, &result);
                ConversationTurn::tool_result(&call.id, result.content, false)
            }
            Ok(result) => {
                tracing::warn!(
                    target: TRACING_TARGET_CHAT,
                    tool = %call.name,
                    message = %result.content,
                    "Tool reported an error"
                );
                payload.record_failure(&call.name, &call.id, &result.content);
                ConversationTurn::tool_result(&call.id, result.content, true)
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_CHAT,
                    tool = %call.name,
                    error = %err,
                    "Tool call failed"
                );
                let message = err.to_string();
                payload.record_failure(&call.name, &call.id, &message);
                ConversationTurn::tool_result(&call.id, message, true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use geoscout_core::BoundingBox;
    use geoscout_overpass::{OverpassClient, OverpassConfig};
    use geoscout_vector::{
        BoundingBoxCache, EngineConfig, MockChip, MockEmbeddingStore, SimilarityEngine,
    };
    use serde_json::json;
    use wiremock::matchers::{method, query_param_contains};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::chat::{DEFAULT_PREAMBLE, TurnContent, TurnRole};
    use crate::provider::{ModelContent, ModelResponse, ScriptedModel};
    use crate::tool::{CallToolResult, SearchMapTool, Tool, ToolRegistry};

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("echo", "Echoes its arguments", json!({"type": "object"}))
        }

        async fn call(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
            if arguments.get("fail").is_some() {
                return Ok(CallToolResult::error("asked to fail"));
            }
            Ok(CallToolResult::structured(arguments))
        }
    }

    fn echo_session(model: Arc<ScriptedModel>, config: ChatConfig) -> ChatSession {
        ChatSession::new(model, Arc::new(ToolRegistry::new().with_tool(Echo)), config).unwrap()
    }

    fn call(id: &str, name: &str, arguments: serde_json::Value) -> ModelResponse {
        ModelResponse::new(vec![ModelContent::tool_call(id, name, arguments)])
    }

    fn roles(session: &ChatSession) -> Vec<TurnRole> {
        session.history().iter().map(|turn| turn.role()).collect()
    }

    #[tokio::test]
    async fn text_answer_needs_no_tools() {
        let model = Arc::new(ScriptedModel::new([ModelResponse::text("Hello!")]));
        let mut session = echo_session(model.clone(), ChatConfig::default());

        let response = session.send("Hi").await.unwrap();

        assert_eq!(response.text, "Hello!");
        assert_eq!(response.rounds, 0);
        assert_eq!(response.payload, ToolPayload::default());
        assert_eq!(roles(&session), [TurnRole::User, TurnRole::Assistant]);
        assert_eq!(session.history()[1].id(), response.id);

        let requests = model.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tools, ["echo"]);
        assert_eq!(requests[0].preamble.as_deref(), Some(DEFAULT_PREAMBLE));
    }

    #[tokio::test]
    async fn tool_calls_run_in_request_order() {
        let model = Arc::new(ScriptedModel::new([
            ModelResponse::new(vec![
                ModelContent::text("Checking both."),
                ModelContent::tool_call("call_1", "echo", json!({"n": 1})),
                ModelContent::tool_call("call_2", "echo", json!({"n": 2})),
            ]),
            ModelResponse::text("Done."),
        ]));
        let mut session = echo_session(model.clone(), ChatConfig::default());

        let response = session.send("Run both").await.unwrap();

        assert_eq!(response.rounds, 1);
        assert_eq!(
            roles(&session),
            [
                TurnRole::User,
                TurnRole::Assistant,
                TurnRole::ToolResult,
                TurnRole::ToolResult,
                TurnRole::Assistant,
            ]
        );
        assert_eq!(session.history()[1].text(), Some("Checking both."));

        let call_ids: Vec<_> = session.history()[2..4]
            .iter()
            .map(|turn| match turn.content() {
                TurnContent::ToolResult { call_id, .. } => call_id.as_str(),
                other => panic!("unexpected content {other:?}"),
            })
            .collect();
        assert_eq!(call_ids, ["call_1", "call_2"]);
        assert_eq!(model.requests().await[1].history.len(), 4);
    }

    #[tokio::test]
    async fn tool_failures_are_folded_into_the_conversation() {
        let model = Arc::new(ScriptedModel::new([
            ModelResponse::new(vec![
                ModelContent::tool_call("call_1", "teleport", json!({})),
                ModelContent::tool_call("call_2", "echo", json!({"fail": true})),
            ]),
            ModelResponse::text("Neither worked."),
        ]));
        let mut session = echo_session(model, ChatConfig::default());

        let response = session.send("Try").await.unwrap();

        assert_eq!(response.text, "Neither worked.");
        assert_eq!(response.payload.errors.len(), 2);
        assert_eq!(response.payload.errors[0].tool, "teleport");
        assert_eq!(response.payload.errors[1].message, "asked to fail");
        assert!(response.payload.is_partial());

        for turn in &session.history()[2..4] {
            assert!(matches!(turn.content(), TurnContent::ToolResult { is_error: true, .. }));
        }
    }

    #[tokio::test]
    async fn model_failure_keeps_user_turn() {
        let model = Arc::new(
            ScriptedModel::new([]).then_fail(Error::provider("scripted", "503 unavailable")),
        );
        let mut session = echo_session(model, ChatConfig::default());

        let err = session.send("Anyone there?").await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(roles(&session), [TurnRole::User]);
        assert_eq!(session.history()[0].text(), Some("Anyone there?"));
    }

    #[tokio::test]
    async fn round_limit_forces_a_text_answer() {
        let model = Arc::new(ScriptedModel::new([
            call("call_1", "echo", json!({})),
            ModelResponse::text("Final."),
        ]));
        let config = ChatConfig::default().with_max_tool_rounds(1);
        let mut session = echo_session(model.clone(), config);

        let response = session.send("Loop").await.unwrap();

        assert_eq!(response.text, "Final.");
        assert_eq!(response.rounds, 1);
        let requests = model.requests().await;
        assert_eq!(requests[0].tools, ["echo"]);
        assert!(requests[1].tools.is_empty());
    }

    #[tokio::test]
    async fn tool_call_past_the_limit_is_a_protocol_error() {
        let model = Arc::new(ScriptedModel::new([
            call("call_1", "echo", json!({})),
            call("call_2", "echo", json!({})),
        ]));
        let config = ChatConfig::default().with_max_tool_rounds(1);
        let mut session = echo_session(model, config);

        let err = session.send("Loop").await.unwrap_err();

        assert!(matches!(err, Error::Protocol(_)));
        assert_eq!(
            geoscout_core::Error::from(err).kind(),
            geoscout_core::ErrorKind::ModelProtocol
        );
    }

    /// Seven adjacent chips along one row; each vector drifts a little
    /// further from the first.
    fn archive() -> MockEmbeddingStore {
        let chips = (0..7)
            .map(|i| {
                let west = -122.50 + f64::from(i) * 0.02;
                MockChip::new(
                    format!("chip-{i}"),
                    BoundingBox::new(37.80, west, 37.81, west + 0.01),
                    vec![1.0, i as f32 * 0.1],
                )
            })
            .collect();
        MockEmbeddingStore::new(chips)
    }

    #[tokio::test]
    async fn marina_search_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param_contains("data", "[\"leisure\"=\"marina\"]"))
            .and(query_param_contains("data", "node(37.7,-122.52,37.85,-122.38)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": [
                {"type": "node", "id": 101, "lon": -122.495, "lat": 37.805,
                 "tags": {"name": "West Harbor", "leisure": "marina"}},
                {"type": "way", "id": 102, "center": {"lon": -122.455, "lat": 37.805},
                 "tags": {"name": "Gashouse Cove", "leisure": "marina"}},
                {"type": "node", "id": 103, "lon": -122.415, "lat": 37.805,
                 "tags": {"name": "Pier 39 Marina", "leisure": "marina"}},
            ]})))
            .expect(1)
            .mount(&server)
            .await;

        let overpass = OverpassClient::new(OverpassConfig::new(server.uri())).unwrap();
        let store = Arc::new(archive());
        let engine = SimilarityEngine::new(
            store.clone(),
            Arc::new(BoundingBoxCache::new()),
            EngineConfig::default(),
        )
        .unwrap();
        let tools = ToolRegistry::new().with_tool(SearchMapTool::new(overpass, engine));

        let model = Arc::new(ScriptedModel::new([
            call(
                "toolu_01",
                "search_map",
                json!({
                    "tags": {"leisure": "marina"},
                    "bbox": [37.70, -122.52, 37.85, -122.38],
                }),
            ),
            ModelResponse::text("I found three marinas."),
        ]));
        let mut session =
            ChatSession::new(model.clone(), Arc::new(tools), ChatConfig::default()).unwrap();

        let response = session.send("Find marinas in San Francisco").await.unwrap();

        assert_eq!(response.text, "I found three marinas.");
        assert_eq!(response.rounds, 1);
        assert!(!response.payload.is_partial());
        assert_eq!(store.extent_calls(), 0);

        let features = &response.payload.features;
        assert_eq!(features.len(), 3);
        let names: Vec<_> = features
            .iter()
            .map(|f| f.feature.name.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(names, ["West Harbor", "Gashouse Cove", "Pier 39 Marina"]);

        for (result, anchor) in features.iter().zip(["chip-0", "chip-2", "chip-4"]) {
            assert_eq!(result.matches.len(), 5);
            assert!(result.matches.iter().all(|m| m.chip_id != anchor));
            assert!(
                result
                    .matches
                    .windows(2)
                    .all(|pair| pair[0].similarity >= pair[1].similarity)
            );
        }

        assert_eq!(
            roles(&session),
            [
                TurnRole::User,
                TurnRole::Assistant,
                TurnRole::ToolResult,
                TurnRole::Assistant,
            ]
        );

        let requests = model.requests().await;
        assert_eq!(requests[0].tools, ["search_map"]);
        match requests[1].history[2].content() {
            TurnContent::ToolResult {
                call_id,
                content,
                is_error,
            } => {
                assert_eq!(call_id, "toolu_01");
                assert!(!is_error);
                assert!(content.contains("Gashouse Cove"));
            }
            other => panic!("unexpected content {other:?}"),
        }
    }
}
