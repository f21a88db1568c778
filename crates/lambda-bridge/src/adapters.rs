//! Constructors wiring event-source handlers into servers.

use crate::dispatch::{BatchDispatcher, BatchHandler, PerRecord, RecordHandler};
use crate::events::EventSource;
use crate::server::InvocationServer;

/// Server delivering each decoded batch from `S` to `handler` in one call.
///
/// # Examples
///
/// ```no_run
/// use lambda_bridge::events::{ChangeStream, ChangeStreamRecord};
/// use lambda_bridge::{BatchHandler, BoxError, InvocationContext, ScopedLogger, event_server};
///
/// struct Audit;
///
/// impl BatchHandler<ChangeStreamRecord> for Audit {
///     fn handle(
///         &self,
///         _context: &InvocationContext,
///         batch: &[ChangeStreamRecord],
///         logger: &ScopedLogger,
///     ) -> Result<(), BoxError> {
///         logger.info(&format!("{} changes", batch.len()));
///         Ok(())
///     }
/// }
///
/// let mut server = event_server::<ChangeStream, _>(Audit);
/// server.init()?;
/// server.run()?;
/// # Ok::<(), lambda_bridge::ServerError>(())
/// ```
#[must_use]
pub fn event_server<S, H>(handler: H) -> InvocationServer
where
    S: EventSource,
    H: BatchHandler<S::Record>,
{
    InvocationServer::new(BatchDispatcher::<S, H>::new(handler))
}

/// Server delivering records from `S` to `handler` one at a time, stopping
/// at the first failure.
#[must_use]
pub fn record_server<S, H>(handler: H) -> InvocationServer
where
    S: EventSource,
    H: RecordHandler<S::Record>,
{
    InvocationServer::new(BatchDispatcher::<S, _>::new(PerRecord::<S, H>::new(handler)))
}
