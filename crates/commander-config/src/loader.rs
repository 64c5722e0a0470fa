use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// Expands `{{ env.VAR }}` placeholders, then deserializes and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if variable expansion, TOML parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_response_config()?;
        self.validate_client_config()?;
        self.validate_server_config()?;
        Ok(())
    }

    fn validate_response_config(&self) -> anyhow::Result<()> {
        let prefix = &self.response.prefix_code;

        if prefix.is_empty() {
            anyhow::bail!("response.prefix_code must not be empty");
        }

        if prefix.chars().any(char::is_whitespace) {
            anyhow::bail!("response.prefix_code must not contain whitespace: '{prefix}'");
        }

        Ok(())
    }

    fn validate_client_config(&self) -> anyhow::Result<()> {
        if self.client.timeout_duration()?.is_zero() {
            anyhow::bail!("client.timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_server_config(&self) -> anyhow::Result<()> {
        if self.server.health.enabled && !self.server.health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/': '{}'", self.server.health.path);
        }

        if self.server.body_limit == 0 {
            anyhow::bail!("server.body_limit must be greater than 0");
        }

        Ok(())
    }
}
