//! Correlation-scoped logging handed to event handlers.

use tracing::Span;

use crate::context::{InvocationContext, request_id};

pub(crate) const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handler");

/// Read-only logging view carrying the invocation's correlation id and, for
/// per-record delivery, the record id.
///
/// Every entry emitted through the logger (or inside [`ScopedLogger::in_scope`])
/// is attached to a `tracing` span holding those fields.
#[derive(Debug, Clone)]
pub struct ScopedLogger {
    span: Span,
    request_id: String,
    record_id: Option<String>,
}

impl ScopedLogger {
    /// Logger scoped to one invocation.
    #[must_use]
    pub fn for_invocation(context: &InvocationContext) -> Self {
        let request_id = request_id(context).to_owned();
        let span = tracing::debug_span!(target: HANDLER_TARGET, "invocation", request_id = %request_id);
        Self {
            span,
            request_id,
            record_id: None,
        }
    }

    /// Child logger additionally carrying `record_id`.
    #[must_use]
    pub fn for_record(&self, record_id: &str) -> Self {
        let span = tracing::debug_span!(
            target: HANDLER_TARGET,
            parent: &self.span,
            "record",
            record_id = %record_id
        );
        Self {
            span,
            request_id: self.request_id.clone(),
            record_id: Some(record_id.to_owned()),
        }
    }

    /// Correlation id of the invocation.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Record id, when scoped to a single record.
    #[must_use]
    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    /// Underlying span.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Runs `f` with the span entered so ad-hoc `tracing` calls inherit the
    /// scope's fields.
    pub fn in_scope<F, T>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.span.in_scope(f)
    }

    /// Emits a debug entry.
    pub fn debug(&self, message: &str) {
        self.in_scope(|| tracing::debug!(target: HANDLER_TARGET, "{message}"));
    }

    /// Emits an info entry.
    pub fn info(&self, message: &str) {
        self.in_scope(|| tracing::info!(target: HANDLER_TARGET, "{message}"));
    }

    /// Emits a warning.
    pub fn warn(&self, message: &str) {
        self.in_scope(|| tracing::warn!(target: HANDLER_TARGET, "{message}"));
    }

    /// Emits an error entry.
    pub fn error(&self, message: &str) {
        self.in_scope(|| tracing::error!(target: HANDLER_TARGET, "{message}"));
    }
}
