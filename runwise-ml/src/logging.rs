//! `tracing` subscriber setup for binaries and test harnesses embedding runwise.

use crate::config::LoggingConfig;
use crate::error::MlError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Build the filter for a config, letting `RUST_LOG` take precedence.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, MlError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| MlError::config(format!("invalid log filter '{}': {e}", config.level)))
}

/// Install a global stderr subscriber. Returns `Ok(false)` if one was already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool, MlError> {
    let filter = env_filter(config)?;

    let layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };

    Ok(tracing_subscriber::registry().with(layer).try_init().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_config_error() {
        let config = LoggingConfig {
            level: "runwise_ml=loud".to_string(),
            json: false,
        };
        if std::env::var(EnvFilter::DEFAULT_ENV).is_err() {
            assert!(env_filter(&config).unwrap_err().is_config());
        }
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config).unwrap();
        assert!(!init_tracing(&config).unwrap());
    }
}
