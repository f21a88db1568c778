//! Test helpers for the transport module.

use std::net::TcpStream;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
    mpsc::{self, Receiver, Sender},
};

use super::ConnectionHandler;

pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _stream: TcpStream) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Holds every connection open until the test releases it.
pub(crate) struct BlockingHandler {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl BlockingHandler {
    /// Returns the handler, a receiver signalled when a connection enters,
    /// and a sender that lets one connection finish.
    pub(crate) fn new() -> (Arc<Self>, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let handler = Arc::new(Self {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        (handler, entered_rx, release_tx)
    }
}

impl ConnectionHandler for BlockingHandler {
    fn handle(&self, _stream: TcpStream) {
        self.entered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(())
            .unwrap_or_default();
        self.release
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv()
            .unwrap_or_default();
    }
}
