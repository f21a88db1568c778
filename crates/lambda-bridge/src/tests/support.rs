//! Shared fixtures for the server test suites.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bridge_config::Config;

use crate::bootstrap::StaticConfigLoader;
use crate::client::InvocationClient;
use crate::context::{InvocationContext, request_id};
use crate::handler::{BoxError, Handler, HandlerFn};
use crate::health::Health;
use crate::protocol::{InvokeRequest, InvokeResponse};
use crate::server::{InvocationServer, ServerError};
use crate::services::{ServiceContainer, ServiceError};

pub(crate) const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Appends `:<request id>` to every string of a JSON array.
pub(crate) fn suffix_handler() -> impl Handler {
    HandlerFn::new(|context, payload| {
        let items: Vec<String> =
            serde_json::from_slice(payload).map_err(|_| "malformed input")?;
        let suffix = request_id(context);
        let suffixed: Vec<String> = items
            .into_iter()
            .map(|item| format!("{item}:{suffix}"))
            .collect();
        Ok(serde_json::to_vec(&suffixed)?)
    })
}

/// Handler that requires the `ServiceA` dependency.
#[derive(Default)]
pub(crate) struct NeedsServiceA {
    service: Option<Arc<String>>,
}

impl Handler for NeedsServiceA {
    fn inject(&mut self, services: &ServiceContainer) -> Result<(), ServiceError> {
        self.service = Some(services.get::<String>("ServiceA")?);
        Ok(())
    }

    fn invoke(&self, _context: &InvocationContext, _payload: &[u8]) -> Result<Vec<u8>, BoxError> {
        Ok(self
            .service
            .as_ref()
            .map(|service| service.as_bytes().to_vec())
            .unwrap_or_default())
    }
}

/// Handler whose initialisation always fails with `oops`.
pub(crate) struct FailingInit;

impl Handler for FailingInit {
    fn init(&mut self, _config: &Config) -> Result<(), BoxError> {
        Err("oops".into())
    }

    fn invoke(&self, _context: &InvocationContext, _payload: &[u8]) -> Result<Vec<u8>, BoxError> {
        Ok(Vec::new())
    }
}

/// Handler that parks each invocation until the test releases it.
pub(crate) struct GateHandler {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl GateHandler {
    /// Returns the handler, a receiver signalled when an invocation starts,
    /// and a sender that lets one invocation finish.
    pub(crate) fn new() -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let handler = Self {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        (handler, entered_rx, release_tx)
    }
}

impl Handler for GateHandler {
    fn invoke(&self, _context: &InvocationContext, payload: &[u8]) -> Result<Vec<u8>, BoxError> {
        self.entered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(())?;
        self.release
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv()?;
        Ok(payload.to_vec())
    }
}

/// Server wired to an ephemeral loopback port and the supplied registry.
pub(crate) fn local_server(handler: impl Handler, health: &Health) -> InvocationServer {
    InvocationServer::new(handler)
        .with_config_loader(Arc::new(StaticConfigLoader::new(Config::default())))
        .with_health(Arc::new(health.clone()))
}

/// Initialised server running on a background thread.
pub(crate) struct RunningServer {
    pub(crate) server: Arc<InvocationServer>,
    runner: Option<JoinHandle<Result<(), ServerError>>>,
}

impl RunningServer {
    pub(crate) fn start(mut server: InvocationServer) -> Self {
        server.init().expect("server should initialise");
        Self::start_initialised(server)
    }

    /// Runs a server whose `init` the caller already performed.
    pub(crate) fn start_initialised(server: InvocationServer) -> Self {
        let shared = Arc::new(server);
        let runner = {
            let running = Arc::clone(&shared);
            thread::spawn(move || running.run())
        };
        Self {
            server: shared,
            runner: Some(runner),
        }
    }

    pub(crate) fn client(&self) -> InvocationClient {
        let addr = self.server.local_addr().expect("bound address");
        let mut client = InvocationClient::connect(addr).expect("connect to server");
        client
            .set_timeout(Some(CLIENT_TIMEOUT))
            .expect("set client timeout");
        client
    }

    pub(crate) fn invoke(&self, payload: &[u8], request_id: &str) -> InvokeResponse {
        self.client()
            .invoke(&InvokeRequest::new(payload.to_vec(), request_id))
            .expect("invoke should get a reply")
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.runner.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stops the server and returns what `run` returned.
    pub(crate) fn shutdown(&mut self) -> Result<(), ServerError> {
        self.server.stop();
        self.join()
    }

    pub(crate) fn join(&mut self) -> Result<(), ServerError> {
        match self.runner.take() {
            Some(runner) => runner.join().expect("server thread should not panic"),
            None => Ok(()),
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.server.stop();
        if let Some(runner) = self.runner.take()
            && runner.join().is_err()
        {
            tracing::warn!("server thread panicked during teardown");
        }
    }
}
