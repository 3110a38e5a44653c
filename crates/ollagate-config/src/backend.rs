use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Ollama backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_url")]
    pub url: Url,

    /// Deadline applied to every backend request, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Model used when a chat or responses request names none
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Model used when an embeddings request names none
    #[serde(default = "default_embedding_model")]
    pub default_embedding_model: String,

    /// List backend models at startup and refuse to start when unreachable
    #[serde(default = "default_verify_on_startup")]
    pub verify_on_startup: bool,

    /// Capacity of the queue between the stream decoder and the response writer
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

impl BackendConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_seconds: default_timeout_seconds(),
            default_model: default_model(),
            default_embedding_model: default_embedding_model(),
            verify_on_startup: default_verify_on_startup(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

fn default_url() -> Url {
    Url::parse("http://localhost:11434").expect("must be a valid URL")
}

#[allow(clippy::missing_const_for_fn)]
fn default_timeout_seconds() -> u64 {
    300
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_verify_on_startup() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_stream_buffer() -> usize {
    16
}
