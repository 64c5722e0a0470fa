#![allow(clippy::must_use_candidate)]

//! Logging for Commander services
//!
//! Installs a `tracing-subscriber` formatter filtered by an `EnvFilter`

use commander_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber from configuration
///
/// An invalid filter directive falls back to `info` rather than failing
/// startup.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    let filter = build_filter(&config.log_filter);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let result = match config.format {
        LogFormat::Text => tracing_subscriber::registry().with(filter).with(fmt_layer).try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json().flatten_event(true))
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    tracing::debug!(filter = %config.log_filter, format = ?config.format, "logging initialized");
    Ok(())
}

/// Build the level filter, falling back to `info` for invalid directives
pub fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter '{directive}', using 'info': {e}");
        EnvFilter::new("info")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_directive_falls_back_to_info() {
        let filter = build_filter("commander=loud");
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn valid_directive_is_kept() {
        let filter = build_filter("commander_client=debug");
        assert_eq!(filter.to_string(), "commander_client=debug");
    }

    #[test]
    fn second_install_fails_instead_of_panicking() {
        let config = TelemetryConfig {
            log_filter: "warn".to_owned(),
            format: LogFormat::Json,
        };

        init(&config).unwrap();
        let err = init(&config).unwrap_err();
        assert!(err.to_string().contains("failed to install log subscriber"));
    }
}
