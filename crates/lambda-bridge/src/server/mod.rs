//! Invocation server lifecycle: listen, serve, drain, stop.
//!
//! An [`InvocationServer`] owns exactly one [`Handler`]. [`init`] resolves
//! the handler's dependencies, loads configuration, and binds the listener;
//! [`run`] blocks on the accept loop and returns once [`stop`] has been
//! called and every in-flight connection has finished.
//!
//! `run` and `stop` take `&self` so a supervisor can share the server behind
//! an `Arc`, running it on one thread and stopping it from another.
//!
//! [`init`]: InvocationServer::init
//! [`run`]: InvocationServer::run
//! [`stop`]: InvocationServer::stop

mod errors;
mod state;

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use bridge_config::Config;

pub use self::errors::ServerError;
pub use self::state::ServerState;
use self::state::StateCell;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader};
use crate::endpoint::FunctionEndpoint;
use crate::handler::Handler;
use crate::health::{Health, HealthRegistrar, HealthStatus, HealthToken};
use crate::services::ServiceContainer;
use crate::transport::{
    ConnectionHandler, ConnectionTracker, InvocationListener, run_accept_loop,
};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Long-lived server exposing one handler to the invoking runtime.
pub struct InvocationServer {
    pending: Option<Box<dyn Handler>>,
    endpoint: Option<Arc<dyn ConnectionHandler>>,
    registrar: Arc<dyn HealthRegistrar>,
    loader: Arc<dyn ConfigLoader>,
    services: Arc<ServiceContainer>,
    token: HealthToken,
    status: Option<Arc<dyn HealthStatus>>,
    config: Option<Config>,
    local_addr: Option<SocketAddr>,
    listener: Mutex<Option<InvocationListener>>,
    closed: AtomicBool,
    state: StateCell,
    tracker: Arc<ConnectionTracker>,
}

impl InvocationServer {
    /// Creates a server for `handler` with default collaborators: a private
    /// [`Health`] registry, the [`SystemConfigLoader`], and an empty
    /// [`ServiceContainer`].
    #[must_use]
    pub fn new(handler: impl Handler) -> Self {
        Self {
            pending: Some(Box::new(handler)),
            endpoint: None,
            registrar: Arc::new(Health::new()),
            loader: Arc::new(SystemConfigLoader),
            services: Arc::new(ServiceContainer::new()),
            token: HealthToken::random(),
            status: None,
            config: None,
            local_addr: None,
            listener: Mutex::new(None),
            closed: AtomicBool::new(false),
            state: StateCell::new(),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Replaces the health registrar.
    #[must_use]
    pub fn with_health(mut self, registrar: Arc<dyn HealthRegistrar>) -> Self {
        self.registrar = registrar;
        self
    }

    /// Replaces the configuration loader.
    #[must_use]
    pub fn with_config_loader(mut self, loader: Arc<dyn ConfigLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Replaces the service container handed to [`Handler::inject`].
    #[must_use]
    pub fn with_services(mut self, services: Arc<ServiceContainer>) -> Self {
        self.services = services;
        self
    }

    /// Prepares the server to run.
    ///
    /// Registers the health token, loads configuration, injects and
    /// initialises the handler, then binds the listener. On failure the
    /// server stays [`ServerState::Created`].
    pub fn init(&mut self) -> Result<(), ServerError> {
        let actual = self.state.get();
        if actual != ServerState::Created {
            return Err(ServerError::InvalidState {
                expected: ServerState::Created,
                actual,
            });
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(ServerError::Closed);
        }

        if self.status.is_none() {
            self.status = Some(self.registrar.register(&self.token)?);
        }

        let config = self.loader.load().map_err(ServerError::Configuration)?;
        config.validate()?;

        let pending = self.pending.as_mut().ok_or(ServerError::InvalidState {
            expected: ServerState::Created,
            actual,
        })?;
        pending.inject(&self.services)?;
        pending.init(&config).map_err(ServerError::HandlerInit)?;

        let listener = InvocationListener::bind(config.server_host(), config.server_port())?;
        let local_addr = listener.local_addr();

        let handler: Arc<dyn Handler> = match self.pending.take() {
            Some(handler) => Arc::from(handler),
            None => {
                return Err(ServerError::InvalidState {
                    expected: ServerState::Created,
                    actual,
                });
            }
        };
        self.endpoint = Some(Arc::new(FunctionEndpoint::new(handler)));
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);
        self.local_addr = Some(local_addr);
        self.config = Some(config);
        self.state.advance(ServerState::Initialized);

        info!(
            target: SERVER_TARGET,
            address = %local_addr,
            health_token = %self.token,
            "invocation server initialised"
        );
        Ok(())
    }

    /// Serves connections until [`stop`](Self::stop) is called, then waits
    /// for in-flight connections and returns.
    ///
    /// A stop that arrives before `run` makes it return immediately. Accept
    /// failures other than the close are returned after draining.
    pub fn run(&self) -> Result<(), ServerError> {
        self.state
            .transition(ServerState::Initialized, ServerState::Running)
            .map_err(|actual| ServerError::InvalidState {
                expected: ServerState::Initialized,
                actual,
            })?;

        let taken = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let outcome = match (taken, self.endpoint.as_ref()) {
            (Some(listener), Some(endpoint)) => {
                self.set_health(true);
                let outcome = run_accept_loop(&listener, &self.closed, endpoint, &self.tracker);
                drop(listener);
                outcome
            }
            _ => {
                debug!(target: SERVER_TARGET, "stop arrived before run; skipping accept loop");
                Ok(())
            }
        };

        self.state.advance(ServerState::Draining);
        if let Err(error) = &outcome {
            warn!(target: SERVER_TARGET, error = %error, "accept loop failed; draining");
        }
        debug!(
            target: SERVER_TARGET,
            in_flight = self.tracker.in_flight(),
            "waiting for in-flight connections"
        );
        self.tracker.wait_idle();
        self.set_health(false);
        self.state.advance(ServerState::Stopped);
        info!(target: SERVER_TARGET, "invocation server stopped");

        outcome.map_err(ServerError::from)
    }

    /// Stops accepting connections. Safe to call any number of times, from
    /// any thread, before, during, or after [`run`](Self::run).
    pub fn stop(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let pending = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if pending.is_some() {
            debug!(target: SERVER_TARGET, "closed listener before run");
        }
        drop(pending);
        info!(
            target: SERVER_TARGET,
            state = %self.state.get(),
            "invocation server stopping"
        );
    }

    /// Address the listener is bound to, once initialised.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn state(&self) -> ServerState {
        self.state.get()
    }

    /// Token this server registers with the health registrar.
    #[must_use]
    pub const fn health_token(&self) -> &HealthToken {
        &self.token
    }

    /// Configuration resolved by [`init`](Self::init).
    #[must_use]
    pub const fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    /// Connections currently being served.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight()
    }

    fn set_health(&self, healthy: bool) {
        if let Some(status) = &self.status {
            status.update(healthy);
        }
    }
}

impl fmt::Debug for InvocationServer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("InvocationServer")
            .field("state", &self.state.get())
            .field("local_addr", &self.local_addr)
            .field("health_token", &self.token)
            .finish_non_exhaustive()
    }
}

