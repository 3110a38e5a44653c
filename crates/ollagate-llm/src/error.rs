use http::StatusCode;
use ollagate_core::HttpError;
use thiserror::Error;

/// Errors that can occur while serving a completion, embedding or model request
#[derive(Debug, Error)]
pub enum LlmError {
    /// Client sent a malformed or invalid request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The backend does not know the requested model
    #[error("model '{model}' not found")]
    ModelNotFound { model: String },

    /// The backend could not be reached or answered with a failure
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Decoding the backend stream failed after it was opened
    #[error("streaming error: {0}")]
    Streaming(String),

    /// The request exceeded the configured backend deadline
    #[error("request timed out")]
    Timeout,

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ModelNotFound { .. } => StatusCode::NOT_FOUND,
            Self::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Streaming(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::ModelNotFound { .. } => "not_found_error",
            Self::Timeout => "timeout_error",
            Self::BackendUnavailable(_) | Self::Streaming(_) | Self::Internal(_) => "server_error",
        }
    }

    fn error_code(&self) -> Option<&str> {
        Some(match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::ModelNotFound { .. } => "model_not_found",
            Self::BackendUnavailable(_) => "ollama_connection_error",
            Self::Timeout => "request_timeout",
            Self::Streaming(_) | Self::Internal(_) => "internal_server_error",
        })
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) | Self::Streaming(_) => "Internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}
