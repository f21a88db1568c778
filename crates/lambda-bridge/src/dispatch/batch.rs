//! Whole-batch delivery: decode once, call the handler once.

use std::fmt;
use std::marker::PhantomData;

use bridge_config::Config;
use tracing::debug;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use crate::context::{InvocationContext, request_id};
use crate::events::EventSource;
use crate::handler::{BoxError, Handler};
use crate::logger::ScopedLogger;
use crate::services::{ServiceContainer, ServiceError};

/// Receives every record of an invocation in a single call.
pub trait BatchHandler<R>: Send + Sync + 'static {
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

    /// Handles the decoded batch, in wire order.
    fn handle(
        &self,
        context: &InvocationContext,
        batch: &[R],
        logger: &ScopedLogger,
    ) -> Result<(), BoxError>;
}

/// Decodes payloads from source `S` and hands each batch to `H`.
///
/// This is the [`Handler`] registered with the server for every event
/// source; only the decode step differs between sources.
pub struct BatchDispatcher<S, H> {
    handler: H,
    source: PhantomData<fn() -> S>,
}

impl<S, H> BatchDispatcher<S, H>
where
    S: EventSource,
    H: BatchHandler<S::Record>,
{
    /// Wraps `handler`.
    #[must_use]
    pub const fn new(handler: H) -> Self {
        Self {
            handler,
            source: PhantomData,
        }
    }

    /// Borrows the wrapped handler.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Decodes `payload` and delivers the batch.
    pub fn dispatch(
        &self,
        context: &InvocationContext,
        payload: &[u8],
    ) -> Result<(), DispatchError> {
        let batch = S::decode(payload).map_err(DispatchError::Decode)?;
        let logger = ScopedLogger::for_invocation(context);

        debug!(
            target: DISPATCH_TARGET,
            request_id = request_id(context),
            source = S::EVENT,
            count = batch.len(),
            "handling {} {} records",
            batch.len(),
            S::EVENT
        );

        self.handler
            .handle(context, &batch, &logger)
            .map_err(|cause| DispatchError::event(S::EVENT, cause))?;

        debug!(
            target: DISPATCH_TARGET,
            request_id = request_id(context),
            source = S::EVENT,
            "{} event handled successfully",
            S::EVENT
        );
        Ok(())
    }
}

impl<S, H> Handler for BatchDispatcher<S, H>
where
    S: EventSource,
    H: BatchHandler<S::Record>,
{
    fn inject(&mut self, services: &ServiceContainer) -> Result<(), ServiceError> {
        self.handler.inject(services)
    }

    fn init(&mut self, config: &Config) -> Result<(), BoxError> {
        self.handler.init(config)
    }

    fn invoke(&self, context: &InvocationContext, payload: &[u8]) -> Result<Vec<u8>, BoxError> {
        self.dispatch(context, payload)?;
        Ok(Vec::new())
    }
}

impl<S, H> fmt::Debug for BatchDispatcher<S, H>
where
    S: EventSource,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BatchDispatcher")
            .field("source", &S::EVENT)
            .finish_non_exhaustive()
    }
}
