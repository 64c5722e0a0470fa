//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use commander_config::{Config, HealthConfig, ServerConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Set the response code prefix
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.config.response.prefix_code = prefix.to_owned();
        self
    }

    /// Set the JSON body limit
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.config.server.body_limit = limit;
        self
    }

    /// Set the outbound call timeout
    pub fn with_client_timeout(mut self, timeout: &str) -> Self {
        self.config.client.timeout = timeout.to_owned();
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
