//! Built-in configuration defaults.

/// Default port requested from the operating system. Zero selects an
/// ephemeral port.
pub const DEFAULT_SERVER_PORT: u16 = 0;

/// Default interface the invocation listener binds to.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Owned listener host used where allocation is required (e.g. serde).
#[must_use]
pub fn default_server_host_string() -> String {
    DEFAULT_SERVER_HOST.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
