//! Ollama HTTP backend

use async_trait::async_trait;
use futures_util::StreamExt;
use ollagate_config::BackendConfig;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{Backend, ChatStream, decode_ndjson};
use crate::error::LlmError;
use crate::protocol::ollama::{ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, ErrorResponse, TagsResponse};

/// Client for the Ollama native API
pub struct OllamaBackend {
    client: Client,
    base_url: Url,
    stream_buffer: usize,
}

impl OllamaBackend {
    /// Create from backend configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::Internal(anyhow::anyhow!("failed to build backend client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            stream_buffer: config.stream_buffer,
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T, model: &str) -> Result<Response, LlmError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(path, &e))?;

        check_status(response, model).await
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self.post("/api/chat", request, &request.model).await?;
        let unit: ChatResponse = read_json(response).await?;

        if let Some(error) = unit.error {
            return Err(LlmError::BackendUnavailable(error));
        }

        Ok(unit)
    }

    async fn open_chat_stream(
        &self,
        request: &ChatRequest,
        token: CancellationToken,
    ) -> Result<ChatStream, LlmError> {
        let response = self.post("/api/chat", request, &request.model).await?;

        let units = decode_ndjson::<ChatResponse, _, _, _>(response.bytes_stream()).map(|decoded| {
            decoded.and_then(|unit| match unit.error {
                Some(error) => Err(LlmError::Streaming(format!("backend reported: {error}"))),
                None => Ok(unit),
            })
        });

        Ok(ChatStream::spawn(units, token, self.stream_buffer))
    }

    async fn embed(&self, request: &EmbedRequest) -> Result<EmbedResponse, LlmError> {
        let response = self.post("/api/embed", request, &request.model).await?;
        read_json(response).await
    }

    async fn list_models(&self) -> Result<TagsResponse, LlmError> {
        let response = self
            .client
            .get(self.endpoint("/api/tags"))
            .send()
            .await
            .map_err(|e| transport_error("/api/tags", &e))?;

        read_json(check_status(response, "").await?).await
    }
}

fn transport_error(path: &str, error: &reqwest::Error) -> LlmError {
    tracing::error!(path, error = %error, "backend request failed");

    if error.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::BackendUnavailable(error.to_string())
    }
}

/// Map non-success statuses onto gateway errors
async fn check_status(response: Response, model: &str) -> Result<Response, LlmError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body).map_or(body, |e| e.error);

    tracing::warn!(status = %status, model, message = %message, "backend returned error");

    if status == StatusCode::NOT_FOUND && !model.is_empty() {
        return Err(LlmError::ModelNotFound { model: model.to_owned() });
    }

    Err(LlmError::BackendUnavailable(format!("backend returned {status}: {message}")))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, LlmError> {
    response
        .json()
        .await
        .map_err(|e| LlmError::BackendUnavailable(format!("failed to parse backend response: {e}")))
}
