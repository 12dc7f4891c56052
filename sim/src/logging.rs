//! Subscriber setup for the binaries.

use std::fs::OpenOptions;
use std::sync::Mutex;

use shop_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

use crate::{Result, SimError};

/// Install the global `tracing` subscriber.
///
/// The configured level is the default; `RUST_LOG` overrides it. Output goes
/// to stderr, or is appended to `log_file` when one is configured.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let level = config.level()?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true);

    let result = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|e| SimError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            log_level: "chatty".to_string(),
            log_file: None,
        };
        assert!(matches!(
            init_tracing(&config),
            Err(SimError::Config(shop_config::ConfigError::InvalidLogLevel(_)))
        ));
    }
}
