use std::collections::HashSet;
use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error when a backend limit is zero or the key table is unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_backend_config()?;
        self.validate_auth_config()?;
        Ok(())
    }

    fn validate_backend_config(&self) -> anyhow::Result<()> {
        if self.backend.timeout_seconds == 0 {
            anyhow::bail!("backend.timeout_seconds must be greater than 0");
        }

        if self.backend.stream_buffer == 0 {
            anyhow::bail!("backend.stream_buffer must be greater than 0");
        }

        if !matches!(self.backend.url.scheme(), "http" | "https") {
            anyhow::bail!("backend.url must use http or https, got '{}'", self.backend.url.scheme());
        }

        Ok(())
    }

    fn validate_auth_config(&self) -> anyhow::Result<()> {
        if !self.auth.enabled {
            return Ok(());
        }

        if self.auth.keys.is_empty() {
            anyhow::bail!("at least one auth.keys entry is required when auth is enabled");
        }

        let mut seen = HashSet::new();

        for entry in &self.auth.keys {
            let key = entry.key.expose_secret();

            if key.is_empty() {
                anyhow::bail!("auth key for alias '{}' must not be empty", entry.alias);
            }

            if entry.alias.is_empty() {
                anyhow::bail!("auth key alias must not be empty");
            }

            if !seen.insert(key) {
                anyhow::bail!("auth key for alias '{}' is configured more than once", entry.alias);
            }
        }

        Ok(())
    }
}
