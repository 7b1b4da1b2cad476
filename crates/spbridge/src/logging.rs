//! Tracing subscriber setup
//!
//! Libraries normally leave this to the application. [`init`] exists for
//! scripts and tools that just want spbridge's log lines on stderr.

use spbridge_auth::ConfigurationError;
use spbridge_core::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Filter for `level`, unless `RUST_LOG` is set
///
/// # Errors
/// [`ConfigurationError::InvalidValue`] when `level` is not a valid filter.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigurationError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => filter_for(&config.level),
    }
}

fn filter_for(level: &str) -> Result<EnvFilter, ConfigurationError> {
    EnvFilter::try_new(level).map_err(|e| ConfigurationError::InvalidValue {
        field: "logging.level",
        reason: e.to_string(),
    })
}

/// Installs a global `fmt` subscriber writing to stderr
///
/// # Errors
/// [`ConfigurationError::InvalidValue`] for a bad level or when a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), ConfigurationError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| ConfigurationError::InvalidValue {
        field: "logging",
        reason: e.to_string(),
    })
}
