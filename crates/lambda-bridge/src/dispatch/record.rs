//! Per-record delivery with fail-fast semantics.

use std::fmt;
use std::marker::PhantomData;

use bridge_config::Config;

use super::batch::BatchHandler;
use super::errors::DispatchError;
use crate::context::InvocationContext;
use crate::events::{EventSource, Identify};
use crate::handler::BoxError;
use crate::logger::ScopedLogger;
use crate::services::{ServiceContainer, ServiceError};

/// Receives records one at a time.
pub trait RecordHandler<R>: Send + Sync + 'static {
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

    /// Handles one record. `logger` carries the record's id.
    fn handle(
        &self,
        context: &InvocationContext,
        record: &R,
        logger: &ScopedLogger,
    ) -> Result<(), BoxError>;
}

/// Turns a [`RecordHandler`] into a [`BatchHandler`].
///
/// Records are delivered sequentially in batch order. The first failure
/// stops the batch: later records are never attempted.
pub struct PerRecord<S, H> {
    handler: H,
    source: PhantomData<fn() -> S>,
}

impl<S, H> PerRecord<S, H>
where
    S: EventSource,
    H: RecordHandler<S::Record>,
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
}

impl<S, H> BatchHandler<S::Record> for PerRecord<S, H>
where
    S: EventSource,
    H: RecordHandler<S::Record>,
{
    fn inject(&mut self, services: &ServiceContainer) -> Result<(), ServiceError> {
        self.handler.inject(services)
    }

    fn init(&mut self, config: &Config) -> Result<(), BoxError> {
        self.handler.init(config)
    }

    fn handle(
        &self,
        context: &InvocationContext,
        batch: &[S::Record],
        logger: &ScopedLogger,
    ) -> Result<(), BoxError> {
        for record in batch {
            let id = record.id();
            let record_logger = logger.for_record(id);
            record_logger.debug("handling record");

            if let Err(cause) = self.handler.handle(context, record, &record_logger) {
                return Err(Box::new(DispatchError::Record {
                    record: S::RECORD,
                    id: id.to_owned(),
                    cause,
                }));
            }
        }

        logger.debug(&format!("{} batch handled successfully", S::RECORD));
        Ok(())
    }
}

impl<S, H> fmt::Debug for PerRecord<S, H>
where
    S: EventSource,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PerRecord")
            .field("record", &S::RECORD)
            .finish_non_exhaustive()
    }
}
