#![allow(clippy::must_use_candidate)]

pub mod auth;
pub mod backend;
mod env;
pub mod health;
mod loader;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use auth::*;
pub use backend::*;
pub use health::*;
pub use server::*;
pub use telemetry::*;

/// Top-level gateway configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Ollama backend configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Bearer key authentication
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging and trace export
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
