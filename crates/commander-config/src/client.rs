use std::time::Duration;

use serde::Deserialize;

/// Outbound REST client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Timeout applied to every call (e.g. "30s", "2m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl ClientConfig {
    /// Parsed call timeout
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout` is not a valid duration
    pub fn timeout_duration(&self) -> anyhow::Result<Duration> {
        duration_str::parse(&self.timeout).map_err(|e| anyhow::anyhow!("invalid client timeout '{}': {e}", self.timeout))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> String {
    "30s".to_string()
}
