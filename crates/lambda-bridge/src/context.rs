//! Per-invocation context handed to handlers.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Returned by [`request_id`] when the caller did not supply a correlation id.
pub const UNKNOWN_REQUEST_ID: &str = "<unknown request id>";

/// Metadata the invoking runtime attaches to a single invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    request_id: Option<String>,
    deadline_ms: Option<i64>,
    invoked_function_arn: Option<String>,
    trace_id: Option<String>,
}

impl InvocationContext {
    /// Context carrying only a correlation id.
    #[must_use]
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            ..Self::default()
        }
    }

    /// Sets the deadline, in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn deadline_ms(mut self, deadline_ms: Option<i64>) -> Self {
        self.deadline_ms = deadline_ms;
        self
    }

    /// Sets the ARN the runtime invoked.
    #[must_use]
    pub fn invoked_function_arn(mut self, arn: Option<String>) -> Self {
        self.invoked_function_arn = arn;
        self
    }

    /// Sets the upstream trace header.
    #[must_use]
    pub fn trace_id(mut self, trace_id: Option<String>) -> Self {
        self.trace_id = trace_id;
        self
    }

    /// Raw correlation id, if the caller provided one.
    #[must_use]
    pub fn raw_request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// ARN of the invoked function, if supplied.
    #[must_use]
    pub fn function_arn(&self) -> Option<&str> {
        self.invoked_function_arn.as_deref()
    }

    /// Upstream trace header, if supplied.
    #[must_use]
    pub fn trace(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Deadline as a point in time, if supplied and representable.
    #[must_use]
    pub fn deadline(&self) -> Option<SystemTime> {
        let millis = u64::try_from(self.deadline_ms?).ok()?;
        UNIX_EPOCH.checked_add(Duration::from_millis(millis))
    }

    /// Time left before the deadline. `None` when no deadline was supplied;
    /// zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let deadline = self.deadline()?;
        Some(
            deadline
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        )
    }
}

/// Returns the correlation id carried by `context`, or
/// [`UNKNOWN_REQUEST_ID`] when none was supplied.
#[must_use]
pub fn request_id(context: &InvocationContext) -> &str {
    match context.raw_request_id() {
        Some(id) if !id.is_empty() => id,
        _ => UNKNOWN_REQUEST_ID,
    }
}
