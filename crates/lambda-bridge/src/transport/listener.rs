//! TCP listener and accept loop for invocation connections.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::tracker::ConnectionTracker;
use super::{ConnectionHandler, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);

/// Bound, non-blocking TCP listener.
///
/// The listener is polled so the accept loop can observe the close flag
/// without another thread having to tear the socket down underneath it.
#[derive(Debug)]
pub(crate) struct InvocationListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl InvocationListener {
    pub(crate) fn bind(host: &str, port: u16) -> Result<Self, ListenerError> {
        let listener = bind_tcp(host, port)?;
        listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub(crate) const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn accept(&self) -> Result<Option<TcpStream>, io::Error> {
        match self.listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                Ok(Some(stream))
            }
            Err(error) if is_transient(&error) => Ok(None),
            Err(error) => Err(error),
        }
    }
}

/// Accepts connections until `closed` is raised, serving each on its own
/// thread registered with `tracker`.
///
/// Returns `Ok(())` once the close flag is observed; any other accept failure
/// ends the loop with an error. In-flight connections are not awaited here.
pub(crate) fn run_accept_loop(
    listener: &InvocationListener,
    closed: &AtomicBool,
    handler: &Arc<dyn ConnectionHandler>,
    tracker: &Arc<ConnectionTracker>,
) -> Result<(), ListenerError> {
    info!(
        target: LISTENER_TARGET,
        address = %listener.local_addr(),
        "invocation listener active"
    );
    let sequence = AtomicU64::new(0);
    while !closed.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok(Some(stream)) => {
                let id = sequence.fetch_add(1, Ordering::Relaxed);
                spawn_connection(id, stream, Arc::clone(handler), tracker);
            }
            Ok(None) => thread::sleep(ACCEPT_BACKOFF),
            Err(source) => return Err(ListenerError::Accept { source }),
        }
    }
    debug!(target: LISTENER_TARGET, "invocation listener observed close");
    Ok(())
}

fn spawn_connection(
    id: u64,
    stream: TcpStream,
    handler: Arc<dyn ConnectionHandler>,
    tracker: &Arc<ConnectionTracker>,
) {
    let in_flight = tracker.track();
    let peer = stream.peer_addr().ok();
    let spawned = thread::Builder::new()
        .name(format!("invocation-conn-{id}"))
        .spawn(move || {
            let _in_flight = in_flight;
            debug!(target: LISTENER_TARGET, connection = id, peer = ?peer, "connection accepted");
            handler.handle(stream);
            debug!(target: LISTENER_TARGET, connection = id, "connection finished");
        });
    if let Err(error) = spawned {
        warn!(
            target: LISTENER_TARGET,
            connection = id,
            error = %error,
            "failed to spawn connection thread"
        );
    }
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::ConnectionAborted
    )
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
