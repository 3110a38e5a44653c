//! Translation between the `OpenAI` and Ollama wire formats
//!
//! Every function here is total: unsupported shapes are dropped rather
//! than rejected, and request validation happens before mapping.

pub mod ollama;
pub mod responses;

pub use ollama::{
    completion_id, to_backend_chat_request, to_chat_completion, to_model, to_model_list, to_stream_chunk,
};
