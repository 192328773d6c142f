//! Scripted language model for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{LanguageModel, ModelRequest, ModelResponse};
use crate::chat::ConversationTurn;
use crate::{Error, Result};

/// What the scripted model was asked.
#[derive(Debug, Clone)]
pub struct ScriptedRequest {
    /// Preamble sent with the call.
    pub preamble: Option<String>,
    /// Snapshot of the history.
    pub history: Vec<ConversationTurn>,
    /// Names of the tools offered.
    pub tools: Vec<String>,
}

/// A [`LanguageModel`] replaying queued responses in order.
///
/// Once the script runs out every call fails with a protocol error.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelResponse>>>,
    requests: Mutex<Vec<ScriptedRequest>>,
}

impl ScriptedModel {
    /// Creates a model answering with the given responses.
    pub fn new(responses: impl IntoIterator<Item = ModelResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::default(),
        }
    }

    /// Queues a failure after the already scripted responses.
    pub fn then_fail(mut self, error: Error) -> Self {
        self.script.get_mut().push_back(Err(error));
        self
    }

    /// Returns every request received so far.
    pub async fn requests(&self) -> Vec<ScriptedRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse> {
        self.requests.lock().await.push(ScriptedRequest {
            preamble: request.preamble.map(str::to_string),
            history: request.history.to_vec(),
            tools: request.tools.iter().map(|tool| tool.name.clone()).collect(),
        });

        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(Error::protocol("script exhausted")))
    }
}
