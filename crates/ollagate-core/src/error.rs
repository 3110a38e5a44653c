use http::StatusCode;
use serde::Serialize;

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type. The server layer
/// converts these into actual HTTP responses, keeping domain errors
/// decoupled from axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `invalid_request_error`)
    fn error_type(&self) -> &str;

    /// Machine-readable error code (e.g. `model_not_found`)
    fn error_code(&self) -> Option<&str> {
        None
    }

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// OpenAI-shaped body for this error
    fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.client_message(), self.error_type(), self.error_code())
    }
}

/// `{"error": {"message", "type", "code"}}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>, error_type: &str, code: Option<&str>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                error_type: error_type.to_owned(),
                code: code.map(str::to_owned),
            },
        }
    }

    /// Body used for unhandled failures at the outermost layer
    pub fn internal() -> Self {
        Self::new("Internal server error", "server_error", Some("internal_server_error"))
    }
}
