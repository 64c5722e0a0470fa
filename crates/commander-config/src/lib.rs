#![allow(clippy::must_use_candidate)]

pub mod client;
mod env;
mod loader;
pub mod response;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use client::*;
pub use response::*;
pub use server::*;
pub use telemetry::*;

/// Top-level Commander configuration
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Response envelope configuration
    #[serde(default)]
    pub response: ResponseConfig,
    /// Outbound REST client configuration
    #[serde(default)]
    pub client: ClientConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
