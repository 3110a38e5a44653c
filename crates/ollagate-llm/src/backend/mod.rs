//! Backend trait and the Ollama HTTP implementation

mod ndjson;
pub mod ollama;
mod stream;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use self::ndjson::decode_ndjson;
pub use self::ollama::OllamaBackend;
pub use self::stream::ChatStream;
use crate::error::LlmError;
use crate::protocol::ollama::{ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, TagsResponse};

/// Inference backend the gateway forwards to
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send a chat request and wait for the single final unit
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Open a streaming chat request
    ///
    /// Fails before any unit is produced when the backend rejects the
    /// request. Cancelling `token` stops delivery and releases the
    /// connection.
    async fn open_chat_stream(&self, request: &ChatRequest, token: CancellationToken)
    -> Result<ChatStream, LlmError>;

    /// Embed a single input
    async fn embed(&self, request: &EmbedRequest) -> Result<EmbedResponse, LlmError>;

    /// List locally available models
    async fn list_models(&self) -> Result<TagsResponse, LlmError>;
}
