//! Invocation bridge between a function runtime and application handlers.
//!
//! The crate runs a small, long-lived [`InvocationServer`] that accepts
//! invocation calls over TCP, hands each payload to a single registered
//! [`Handler`], and reports the result. Readiness is published through a
//! [`HealthRegistrar`] and shutdown drains every in-flight connection before
//! [`InvocationServer::run`] returns.
//!
//! Event-source integrations share one decode-then-deliver engine. An
//! [`EventSource`](events::EventSource) describes the wire shape of a batch;
//! [`BatchDispatcher`] decodes it and delivers the ordered records either in
//! one call ([`BatchHandler`]) or one at a time with fail-fast semantics
//! ([`RecordHandler`]). [`event_server`] and [`record_server`] build servers
//! for both styles.
//!
//! Handlers receive their dependencies through [`Handler::inject`] from an
//! explicit [`ServiceContainer`] and their configuration through
//! [`Handler::init`]. Logging uses `tracing`; binaries may install the stock
//! subscriber with [`telemetry::initialise`] or [`bootstrap_with`].

mod adapters;
mod bootstrap;
mod client;
mod context;
pub mod dispatch;
mod endpoint;
pub mod events;
mod handler;
mod health;
mod logger;
mod process;
pub mod protocol;
mod server;
mod services;
pub mod telemetry;
mod transport;

pub use adapters::{event_server, record_server};
pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use client::InvocationClient;
pub use context::{InvocationContext, UNKNOWN_REQUEST_ID, request_id};
pub use dispatch::{BatchDispatcher, BatchHandler, DispatchError, PerRecord, RecordHandler};
pub use handler::{BoxError, Handler, HandlerFn};
pub use health::{Health, HealthError, HealthRegistrar, HealthStatus, HealthToken};
pub use logger::ScopedLogger;
pub use process::{ShutdownError, ShutdownSignal, SuperviseError, supervise};
pub use server::{InvocationServer, ServerError, ServerState};
pub use services::{ServiceContainer, ServiceError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
