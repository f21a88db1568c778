//! Shared configuration for the invocation bridge.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, an optional
//! configuration file (`--config-path` or `LAMBDA_CONFIG_PATH`), `LAMBDA_*`
//! environment variables, and finally command-line flags. The invocation
//! runtime normally supplies the listener port through `LAMBDA_SERVER_PORT`.

mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, default_log_filter,
    default_log_filter_string, default_log_format, default_server_host_string,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "LAMBDA")]
pub struct Config {
    /// Interface the invocation listener binds to.
    #[serde(default = "default_server_host_string")]
    #[ortho_config(default = default_server_host_string())]
    pub server_host: String,
    /// Port the invocation listener binds to; `0` requests an ephemeral port.
    #[serde(default)]
    #[ortho_config(default = DEFAULT_SERVER_PORT)]
    pub server_port: u16,
    /// `tracing` filter expression applied to the subscriber.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: default_server_host_string(),
            server_port: DEFAULT_SERVER_PORT,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Interface the listener should bind.
    #[must_use]
    pub fn server_host(&self) -> &str {
        &self.server_host
    }

    /// Port the listener should bind.
    #[must_use]
    pub const fn server_port(&self) -> u16 {
        self.server_port
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Checks values the loader cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server_host.trim().is_empty() {
            return Err(ConfigValidationError::EmptyHost);
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigValidationError::EmptyLogFilter);
        }
        Ok(())
    }
}

/// Errors raised when a loaded configuration is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    /// The listener host was blank.
    #[error("server_host must not be empty")]
    EmptyHost,
    /// The log filter was blank.
    #[error("log_filter must not be empty")]
    EmptyLogFilter,
}
