//! OpenAI-compatible front end for an Ollama backend
//!
//! Maps OpenAI chat, responses, embeddings and model requests onto the
//! Ollama wire format, drives the backend (including NDJSON streaming) and
//! reshapes replies into OpenAI JSON or server-sent events.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod backend;
pub mod convert;
mod embeddings;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod state;
mod streaming;
pub mod tokens;

pub use backend::{Backend, ChatStream, OllamaBackend};
pub use error::LlmError;
pub use handler::llm_router;
pub use state::LlmState;
pub use streaming::{FrameStream, StreamFrame};
