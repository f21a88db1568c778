//! The contract between the invocation server and the code it serves.

use std::error::Error as StdError;
use std::fmt;

use bridge_config::Config;

use crate::context::InvocationContext;
use crate::services::{ServiceContainer, ServiceError};

/// Boxed error type returned by handler callbacks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Function served by an [`InvocationServer`](crate::InvocationServer).
///
/// The server calls [`Handler::inject`] and [`Handler::init`] once during
/// startup, then [`Handler::invoke`] once per invocation. Invocations arriving
/// on different connections run concurrently, so `invoke` must tolerate being
/// called from several threads at once.
pub trait Handler: Send + Sync + 'static {
    /// Resolves dependencies from the service container.
    fn inject(&mut self, services: &ServiceContainer) -> Result<(), ServiceError> {
        let _ = services;
        Ok(())
    }

    /// Performs one-time setup after dependencies are resolved.
    fn init(&mut self, config: &Config) -> Result<(), BoxError> {
        let _ = config;
        Ok(())
    }

    /// Handles one invocation, returning the response payload.
    fn invoke(&self, context: &InvocationContext, payload: &[u8]) -> Result<Vec<u8>, BoxError>;
}

/// Adapts a closure into a [`Handler`] with no dependencies or setup.
pub struct HandlerFn<F>(F);

impl<F> HandlerFn<F>
where
    F: Fn(&InvocationContext, &[u8]) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
{
    /// Wraps `f`.
    #[must_use]
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&InvocationContext, &[u8]) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
{
    fn invoke(&self, context: &InvocationContext, payload: &[u8]) -> Result<Vec<u8>, BoxError> {
        (self.0)(context, payload)
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

