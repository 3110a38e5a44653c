use axum::Json;
use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode, header};
use ollagate_core::HttpError;
use thiserror::Error;

/// Bearer authentication failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing API key")]
    MissingKey,

    #[error("Invalid authorization header format")]
    MalformedHeader,

    #[error("Invalid API key")]
    InvalidKey,
}

impl HttpError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingKey | Self::MalformedHeader => StatusCode::UNAUTHORIZED,
            Self::InvalidKey => StatusCode::FORBIDDEN,
        }
    }

    fn error_type(&self) -> &str {
        "authentication_error"
    }

    fn error_code(&self) -> Option<&str> {
        Some(match self {
            Self::MissingKey => "missing_api_key",
            Self::MalformedHeader => "invalid_authorization_header",
            Self::InvalidKey => "invalid_api_key",
        })
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), Json(self.to_body())).into_response();

        if matches!(self, Self::MissingKey) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(r#"Bearer realm="api""#));
        }

        response
    }
}

/// Requests that match no route
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl HttpError for RouteError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::NotFound => "not_found_error",
            Self::MethodNotAllowed => "invalid_request_error",
        }
    }

    fn error_code(&self) -> Option<&str> {
        Some(match self {
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
        })
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

pub async fn not_found() -> RouteError {
    RouteError::NotFound
}

pub async fn method_not_allowed() -> RouteError {
    RouteError::MethodNotAllowed
}
