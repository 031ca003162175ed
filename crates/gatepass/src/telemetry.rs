//! Tracing setup for the gate pass binaries.
//!
//! A `RUST_LOG` directive in the environment wins; otherwise the filter
//! falls back to the `APP_LOG_LEVEL` value carried in [`TelemetryConfig`].

use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    /// The configured log directive did not parse as an `EnvFilter`.
    BadDirective { directive: String, source: ParseError },
    /// Installing the subscriber failed, usually because one is already set.
    Install(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::BadDirective { directive, .. } => {
                write!(f, "unusable log directive '{directive}'")
            }
            TelemetryError::Install(err) => {
                write!(f, "failed to install tracing subscriber: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::BadDirective { source, .. } => Some(source),
            TelemetryError::Install(err) => Some(&**err),
        }
    }
}

fn resolve_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|source| {
            TelemetryError::BadDirective {
                directive: config.log_level.clone(),
                source,
            }
        }),
    }
}

/// Installs the global subscriber: compact single-line output without
/// ANSI colour, suitable for service logs.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(resolve_filter(config)?)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(TelemetryError::Install)
}
