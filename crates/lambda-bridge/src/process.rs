//! Runs a server until a shutdown signal arrives.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::server::{InvocationServer, ServerError};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Errors raised while supervising a running server.
#[derive(Debug, Error)]
pub enum SuperviseError {
    /// The server thread could not be spawned.
    #[error("failed to spawn server thread: {0}")]
    Spawn(#[source] io::Error),
    /// Waiting for the shutdown signal failed; the server was still stopped.
    #[error(transparent)]
    Signal(#[from] ShutdownError),
    /// The server's run loop failed.
    #[error(transparent)]
    Server(#[from] ServerError),
    /// The server thread panicked.
    #[error("server thread panicked")]
    Panicked,
}

/// First of the two events a supervisor waits on.
enum Supervised {
    Signalled(Result<(), ShutdownError>),
    Finished,
}

/// Reports the end of the server thread, including when `run` unwinds.
struct FinishedOnExit(Sender<Supervised>);

impl Drop for FinishedOnExit {
    fn drop(&mut self) {
        if self.0.send(Supervised::Finished).is_err() {
            debug!(target: PROCESS_TARGET, "supervisor gone before server finished");
        }
    }
}

/// Runs `server` on a dedicated thread until `signal` fires or `run`
/// returns on its own, whichever happens first.
///
/// On a signal the server is stopped and drained. When `run` ends first its
/// outcome is returned at once; the signal listener thread is left waiting.
pub fn supervise(
    server: &Arc<InvocationServer>,
    signal: Arc<dyn ShutdownSignal>,
) -> Result<(), SuperviseError> {
    let (events, received) = mpsc::channel();

    let runner = {
        let running = Arc::clone(server);
        let finished = FinishedOnExit(events.clone());
        thread::Builder::new()
            .name("invocation-server".to_owned())
            .spawn(move || {
                let _finished = finished;
                running.run()
            })
            .map_err(SuperviseError::Spawn)?
    };

    thread::Builder::new()
        .name("shutdown-signal".to_owned())
        .spawn(move || {
            let waited = signal.wait();
            if events.send(Supervised::Signalled(waited)).is_err() {
                debug!(target: PROCESS_TARGET, "shutdown signal arrived after supervision ended");
            }
        })
        .map_err(|error| {
            server.stop();
            SuperviseError::Spawn(error)
        })?;

    let waited = match received.recv() {
        Ok(Supervised::Signalled(waited)) => {
            info!(target: PROCESS_TARGET, "stopping invocation server");
            server.stop();
            waited
        }
        Ok(Supervised::Finished) | Err(_) => {
            warn!(
                target: PROCESS_TARGET,
                state = %server.state(),
                "invocation server exited before a shutdown signal"
            );
            Ok(())
        }
    };

    let outcome = runner.join().map_err(|_| SuperviseError::Panicked)?;
    outcome?;
    waited?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Receiver;
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use bridge_config::Config;

    use crate::bootstrap::StaticConfigLoader;
    use crate::handler::HandlerFn;
    use crate::server::ServerState;

    struct ChannelSignal(Mutex<Receiver<()>>);

    impl ChannelSignal {
        fn new() -> (Sender<()>, Self) {
            let (tx, rx) = mpsc::channel();
            (tx, Self(Mutex::new(rx)))
        }
    }

    impl ShutdownSignal for ChannelSignal {
        fn wait(&self) -> Result<(), ShutdownError> {
            // A dropped trigger counts as a shutdown request.
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv()
                .unwrap_or_default();
            Ok(())
        }
    }

    struct FailingSignal;

    impl ShutdownSignal for FailingSignal {
        fn wait(&self) -> Result<(), ShutdownError> {
            Err(ShutdownError::Install {
                source: io::Error::other("no signals here"),
            })
        }
    }

    /// Signal that only fires once the test drops its trigger.
    fn silent_signal() -> (Sender<()>, Arc<dyn ShutdownSignal>) {
        let (trigger, signal) = ChannelSignal::new();
        (trigger, Arc::new(signal))
    }

    fn echo_server() -> InvocationServer {
        InvocationServer::new(HandlerFn::new(|_, payload| Ok(payload.to_vec())))
            .with_config_loader(Arc::new(StaticConfigLoader::new(Config::default())))
    }

    fn initialised_server() -> Arc<InvocationServer> {
        let mut server = echo_server();
        server.init().expect("init server");
        Arc::new(server)
    }

    #[test]
    fn stops_the_server_once_signalled() {
        let server = initialised_server();
        let (trigger, signal) = silent_signal();
        trigger.send(()).expect("send shutdown");

        supervise(&server, signal).expect("supervise");
        assert_eq!(server.state(), ServerState::Stopped);
    }

    #[test]
    fn signal_failures_still_stop_the_server() {
        let server = initialised_server();
        let error = supervise(&server, Arc::new(FailingSignal)).expect_err("signal fails");
        assert!(matches!(error, SuperviseError::Signal(_)));
        assert_eq!(server.state(), ServerState::Stopped);
    }

    #[test]
    fn run_failures_surface_without_a_signal() {
        let server = Arc::new(echo_server());
        let (trigger, signal) = silent_signal();

        let (done_tx, done_rx) = mpsc::channel();
        let supervisor = {
            let uninitialised = Arc::clone(&server);
            thread::spawn(move || {
                done_tx
                    .send(supervise(&uninitialised, signal))
                    .expect("report outcome");
            })
        };

        let outcome = done_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("supervise returns before any signal");
        assert!(matches!(
            outcome,
            Err(SuperviseError::Server(ServerError::InvalidState {
                expected: ServerState::Initialized,
                actual: ServerState::Created,
            }))
        ));
        supervisor.join().expect("supervisor thread");
        drop(trigger);
    }
}
