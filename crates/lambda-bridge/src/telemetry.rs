//! Process-wide `tracing` subscriber for bridge binaries.
//!
//! Libraries embedding the bridge usually install their own subscriber; the
//! helpers here exist for binaries that want the stock JSON or compact output
//! driven by [`Config`].

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use bridge_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Proof that the global subscriber is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Offending expression.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another subscriber was installed outside this module.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls return a new handle without touching the installed
/// subscriber, even when `config` differs.
///
/// # Examples
///
/// ```rust
/// use bridge_config::Config;
/// use lambda_bridge::telemetry;
///
/// # fn main() -> Result<(), lambda_bridge::telemetry::TelemetryError> {
/// let config = Config::default();
/// let _handle = telemetry::initialise(&config)?;
/// let _again = telemetry::initialise(&config)?;
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| {
            let subscriber = build_subscriber(config)?;
            tracing::subscriber::set_global_default(subscriber)
                .map_err(TelemetryError::Subscriber)
        })
        .map(|()| TelemetryHandle)
}

/// Builds the subscriber described by `config` without installing it.
pub fn build_subscriber(
    config: &Config,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let filter = parse_filter(config.log_filter())?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_names(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    })
}

fn parse_filter(filter: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(filter).map_err(|error| TelemetryError::Filter {
        filter: filter.to_owned(),
        message: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LogFormat::Json)]
    #[case(LogFormat::Compact)]
    fn builds_each_format(#[case] log_format: LogFormat) {
        let config = Config {
            log_format,
            log_filter: "lambda_bridge=debug".to_owned(),
            ..Config::default()
        };
        assert!(build_subscriber(&config).is_ok());
    }

    #[test]
    fn rejects_malformed_filters() {
        let config = Config {
            log_filter: "lambda_bridge=loud".to_owned(),
            ..Config::default()
        };
        let error = build_subscriber(&config).err().expect("filter should be rejected");
        assert!(matches!(error, TelemetryError::Filter { ref filter, .. } if filter == "lambda_bridge=loud"));
    }
}
