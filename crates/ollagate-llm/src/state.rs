//! Completion orchestration shared by the HTTP handlers

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ollagate_config::BackendConfig;
use ollagate_core::{Alias, RequestContext};
use ollagate_telemetry::metrics::GatewayMetrics;
use ollagate_usage::UsageLedger;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::backend::{Backend, OllamaBackend};
use crate::convert::{to_backend_chat_request, to_chat_completion, to_model, to_model_list};
use crate::error::LlmError;
use crate::protocol::openai::{ChatCompletion, ChatRequest, Model, ModelList, ResponseObject, ResponsesRequest};
use crate::tokens::{estimate_message_tokens, estimate_tokens};

/// Shared state for LLM route handlers
#[derive(Clone)]
pub struct LlmState {
    pub(crate) inner: Arc<LlmStateInner>,
}

pub(crate) struct LlmStateInner {
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) ledger: UsageLedger,
    pub(crate) metrics: GatewayMetrics,
    pub(crate) default_model: String,
    pub(crate) default_embedding_model: String,
    pub(crate) timeout: Duration,
    /// Parent of every streaming session's cancellation token
    pub(crate) streams: CancellationToken,
}

impl LlmState {
    /// Build state around an arbitrary backend
    pub fn new(backend: Arc<dyn Backend>, ledger: UsageLedger, config: &BackendConfig) -> Self {
        Self {
            inner: Arc::new(LlmStateInner {
                backend,
                ledger,
                metrics: GatewayMetrics::new(),
                default_model: config.default_model.clone(),
                default_embedding_model: config.default_embedding_model.clone(),
                timeout: config.timeout(),
                streams: CancellationToken::new(),
            }),
        }
    }

    /// Build state talking to the configured Ollama server
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &BackendConfig, ledger: UsageLedger) -> Result<Self, LlmError> {
        let backend = OllamaBackend::new(config)?;
        Ok(Self::new(Arc::new(backend), ledger, config))
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.inner.ledger
    }

    /// End every open streaming completion without a `[DONE]` marker
    ///
    /// Called on graceful shutdown so long-lived SSE responses do not
    /// hold the server open.
    pub fn shutdown_streams(&self) {
        self.inner.streams.cancel();
    }

    /// Cancellation token for a new streaming session
    ///
    /// Client disconnects are handled by dropping the stream, this token
    /// only carries server shutdown.
    pub(crate) fn stream_token(&self) -> CancellationToken {
        self.inner.streams.child_token()
    }

    /// Execute a non-streaming chat completion
    ///
    /// # Errors
    ///
    /// Returns an error if the request has no messages, the backend call
    /// fails, or the deadline passes.
    pub async fn complete(&self, request: ChatRequest, context: &RequestContext) -> Result<ChatCompletion, LlmError> {
        let request = self.prepare_chat(request)?;

        let mut backend_request = to_backend_chat_request(&request);
        backend_request.stream = false;

        let prompt_tokens = estimate_message_tokens(&request.messages);

        let unit = with_deadline(self.deadline(), self.inner.backend.chat(&backend_request)).await?;

        let completion_tokens = estimate_tokens(&unit.message.content);
        self.record_completion(&context.alias, &request.model, prompt_tokens, completion_tokens);

        Ok(to_chat_completion(&unit, &request.model, prompt_tokens, completion_tokens))
    }

    /// Execute a non-streaming Responses API request
    ///
    /// # Errors
    ///
    /// Same as [`LlmState::complete`].
    pub async fn respond(&self, request: ResponsesRequest, context: &RequestContext) -> Result<ResponseObject, LlmError> {
        let completion = self.complete(request.into(), context).await?;
        Ok(completion.into())
    }

    /// List the backend's model catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    pub async fn list_models(&self) -> Result<ModelList, LlmError> {
        let tags = with_deadline(self.deadline(), self.inner.backend.list_models()).await?;
        Ok(to_model_list(&tags))
    }

    /// Describe a single model by exact name
    ///
    /// # Errors
    ///
    /// Returns `ModelNotFound` if the catalog has no such model.
    pub async fn get_model(&self, name: &str) -> Result<Model, LlmError> {
        let tags = with_deadline(self.deadline(), self.inner.backend.list_models()).await?;

        tags.models
            .iter()
            .find(|info| info.name == name)
            .map(to_model)
            .ok_or_else(|| LlmError::ModelNotFound { model: name.to_owned() })
    }

    /// Check that the backend answers and return its model names
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached in time.
    pub async fn verify_backend(&self) -> Result<Vec<String>, LlmError> {
        let tags = with_deadline(self.deadline(), self.inner.backend.list_models()).await?;
        Ok(tags.models.into_iter().map(|info| info.name).collect())
    }

    /// Validate a chat request and apply the default model
    pub(crate) fn prepare_chat(&self, mut request: ChatRequest) -> Result<ChatRequest, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::InvalidRequest(
                "request must contain at least one message".to_owned(),
            ));
        }

        if request.model.is_empty() {
            request.model.clone_from(&self.inner.default_model);
        }

        Ok(request)
    }

    pub(crate) fn deadline(&self) -> Instant {
        Instant::now() + self.inner.timeout
    }

    pub(crate) fn record_completion(&self, alias: &Alias, model: &str, prompt_tokens: u64, completion_tokens: u64) {
        self.inner.ledger.record_completion(alias, prompt_tokens, completion_tokens);
        self.inner.metrics.record_completion(model, prompt_tokens, completion_tokens);

        tracing::debug!(%alias, model, prompt_tokens, completion_tokens, "recorded completion usage");
    }

    pub(crate) fn record_embedding(&self, alias: &Alias, model: &str, tokens: u64) {
        self.inner.ledger.record_embedding(alias, tokens);
        self.inner.metrics.record_embedding(model, tokens);

        tracing::debug!(%alias, model, tokens, "recorded embedding usage");
    }
}

/// Bound a backend call by the request deadline
pub(crate) async fn with_deadline<T>(
    deadline: Instant,
    call: impl Future<Output = Result<T, LlmError>>,
) -> Result<T, LlmError> {
    tokio::time::timeout_at(deadline, call).await.map_err(|_| LlmError::Timeout)?
}
