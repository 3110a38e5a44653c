//! Wire format types for the client-facing and backend-facing APIs

pub mod ollama;
pub mod openai;
