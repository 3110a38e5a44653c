use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, header};
use ollagate_config::AuthConfig;
use ollagate_core::Alias;
use secrecy::ExposeSecret;

use crate::error::AuthError;

/// Configured bearer keys and the aliases they resolve to
#[derive(Debug, Default)]
pub struct KeyStore {
    enabled: bool,
    public_paths: Vec<String>,
    aliases: HashMap<String, String>,
}

impl KeyStore {
    pub fn from_config(config: &AuthConfig) -> Self {
        let aliases = config
            .keys
            .iter()
            .map(|key| (key.key.expose_secret().to_owned(), key.alias.clone()))
            .collect();

        Self {
            enabled: config.enabled,
            public_paths: config.public_paths.clone(),
            aliases,
        }
    }

    fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| public == path)
    }

    /// Resolve a mandatory bearer key
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Alias, AuthError> {
        let value = headers.get(header::AUTHORIZATION).ok_or(AuthError::MissingKey)?;

        let key = value
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AuthError::MalformedHeader)?;

        self.aliases.get(key).map(Alias::new).ok_or(AuthError::InvalidKey)
    }

    /// Best-effort alias for requests that are let through without a key
    pub fn identify(&self, headers: &HeaderMap) -> Alias {
        let key = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .filter(|key| !key.is_empty());

        match key {
            None => Alias::unknown(),
            Some(key) => self.aliases.get(key).map_or_else(Alias::unresolved, Alias::new),
        }
    }
}

/// Resolve the caller's alias and reject unauthenticated requests
///
/// Public paths, and every path when auth is disabled, are let through
/// with a best-effort alias.
pub async fn auth_middleware(keys: Arc<KeyStore>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path();

    let alias = if !keys.enabled || keys.is_public(path) {
        keys.identify(request.headers())
    } else {
        match keys.authenticate(request.headers()) {
            Ok(alias) => alias,
            Err(e) => {
                tracing::warn!(path, error = %e, "rejected request");
                return e.into_response();
            }
        }
    };

    request.extensions_mut().insert(alias);
    next.run(request).await
}
