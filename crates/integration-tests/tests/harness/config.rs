//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use ollagate_config::{ApiKeyConfig, AuthConfig, BackendConfig, Config, ServerConfig};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal config pointed at a mock backend, auth disabled
    pub fn new(backend_url: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: SocketAddr::from(([127, 0, 0, 1], 0)),
                    ..ServerConfig::default()
                },
                backend: BackendConfig {
                    url: backend_url.parse().expect("valid URL"),
                    verify_on_startup: false,
                    ..BackendConfig::default()
                },
                auth: AuthConfig {
                    enabled: false,
                    ..AuthConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Require bearer auth and accept `key` as `alias`
    pub fn with_key(mut self, key: &str, alias: &str) -> Self {
        self.config.auth.enabled = true;
        self.config.auth.keys.push(ApiKeyConfig {
            key: SecretString::from(key),
            alias: alias.to_owned(),
        });
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config.backend.timeout_seconds = seconds;
        self
    }

    pub fn verify_on_startup(mut self) -> Self {
        self.config.backend.verify_on_startup = true;
        self
    }

    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
