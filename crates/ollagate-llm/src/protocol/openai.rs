//! `OpenAI` chat, responses, embeddings and models wire format types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// -- Chat request types --

/// `OpenAI` chat completion request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier, empty selects the configured default
    #[serde(default)]
    pub model: String,
    /// Conversation messages
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Requested output format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    pub fn is_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

/// `{"type": "json_object"}` or `{"type": "text"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// `OpenAI` message within a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role (`system`, `user`, `assistant`, `tool`)
    pub role: String,
    /// Content (string or array of content parts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl ChatMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(MessageContent::Text(content.into())),
        }
    }
}

/// `OpenAI` content can be a string or array of content parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Array of content parts
    Parts(Vec<ContentPart>),
}

/// Individual content part in an `OpenAI` message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text {
        /// The text string
        text: String,
    },
    /// Image content via URL
    ImageUrl {
        /// Image URL specification
        image_url: ImageUrl,
    },
    /// Any part the gateway does not translate, including malformed ones
    Unsupported,
}

impl ContentPart {
    fn from_value(value: &Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("text" | "input_text") => value
                .get("text")
                .and_then(Value::as_str)
                .map_or(Self::Unsupported, |text| Self::Text { text: text.to_owned() }),
            Some("image_url") => value
                .get("image_url")
                .and_then(ImageUrl::from_value)
                .map_or(Self::Unsupported, |image_url| Self::ImageUrl { image_url }),
            _ => Self::Unsupported,
        }
    }
}

impl<'de> Deserialize<'de> for ContentPart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}

/// Image URL specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    /// Image URL or base64 data URI
    pub url: String,
    /// Detail level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ImageUrl {
    /// Accepts both `{"url": ...}` and a bare URL string
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(url) => Some(Self {
                url: url.clone(),
                detail: None,
            }),
            Value::Object(fields) => Some(Self {
                url: fields.get("url")?.as_str()?.to_owned(),
                detail: fields.get("detail").and_then(Value::as_str).map(ToOwned::to_owned),
            }),
            _ => None,
        }
    }
}

// -- Chat response types --

/// `OpenAI` chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    /// Always `chat.completion`
    pub object: String,
    /// Unix timestamp in seconds
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

/// Choice within a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

/// Message within a response choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Always `assistant`
    pub role: String,
    pub content: String,
}

/// Token usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub const fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

// -- Streaming types --

/// `OpenAI` streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// Shared by every chunk of one completion
    pub id: String,
    /// Always `chat.completion.chunk`
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<StreamChoice>,
}

/// Choice within a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    pub index: u32,
    pub delta: StreamDelta,
    /// Empty until the terminal chunk, then `stop`
    pub finish_reason: String,
}

/// Incremental message fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
}

// -- Embeddings types --

/// `OpenAI` embeddings request
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingRequest {
    /// Model identifier, empty selects the configured default
    #[serde(default)]
    pub model: String,
    /// Input text or list of texts
    pub input: EmbeddingInput,
}

/// Embedding input can be a single string or an array of strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    /// Single text input
    Single(String),
    /// Multiple text inputs
    Multiple(Vec<String>),
}

impl EmbeddingInput {
    /// Inputs in request order
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(text) => vec![text],
            Self::Multiple(texts) => texts,
        }
    }
}

/// `OpenAI` embeddings response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingList {
    /// Always `list`
    pub object: String,
    pub data: Vec<Embedding>,
    pub model: String,
    pub usage: EmbeddingUsage,
}

/// One embedding vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    /// Always `embedding`
    pub object: String,
    pub embedding: Vec<f64>,
    pub index: usize,
}

/// Token usage for an embeddings request
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    pub prompt_tokens: u64,
    pub total_tokens: u64,
}

// -- Models types --

/// `OpenAI` models list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    /// Always `list`
    pub object: String,
    pub data: Vec<Model>,
}

/// `OpenAI` model entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    /// Always `model`
    pub object: String,
    /// Unix timestamp in seconds
    pub created: i64,
    /// Always `ollama`
    pub owned_by: String,
}

// -- Responses API types --

/// Simplified `OpenAI` Responses API request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsesRequest {
    /// Model identifier, empty selects the configured default
    #[serde(default)]
    pub model: String,
    /// Prompt text or list of input items
    #[serde(default)]
    pub input: Option<ResponsesInput>,
    /// Maximum tokens to generate
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Whether to stream the response
    #[serde(default)]
    pub stream: Option<bool>,
}

/// Responses input is either a prompt string or a list of items
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResponsesInput {
    Text(String),
    Items(Vec<InputItem>),
}

/// Conversation item within a Responses request
#[derive(Debug, Clone, Deserialize)]
pub struct InputItem {
    /// Defaults to `user`
    #[serde(default)]
    pub role: Option<String>,
    /// Items without content are skipped
    #[serde(default)]
    pub content: Option<MessageContent>,
}

/// Simplified `OpenAI` Responses API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseObject {
    /// `resp_` prefixed identifier
    pub id: String,
    /// Always `response`
    pub object: String,
    pub created: i64,
    pub model: String,
    pub output: Vec<OutputItem>,
    pub usage: Usage,
}

/// Output item within a Responses response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputItem {
    /// Always `message`
    #[serde(rename = "type")]
    pub item_type: String,
    pub role: String,
    pub content: Vec<OutputContent>,
}

/// Text content within an output item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputContent {
    /// Always `text`
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}
