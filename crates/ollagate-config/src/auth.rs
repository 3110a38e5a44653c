use secrecy::SecretString;
use serde::Deserialize;

/// Bearer key authentication configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Whether requests must present a bearer key
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Paths that skip authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,

    /// Accepted keys and the alias each one resolves to
    #[serde(default)]
    pub keys: Vec<ApiKeyConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            public_paths: default_public_paths(),
            keys: Vec::new(),
        }
    }
}

/// A single accepted API key
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyConfig {
    pub key: SecretString,
    /// Identity used to bucket usage for this key
    pub alias: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string(), "/usage".to_string()]
}
