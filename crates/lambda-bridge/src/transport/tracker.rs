//! Counts connection threads still in flight so shutdown can drain them.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Wait-group over connection-serving threads.
#[derive(Debug, Default)]
pub(crate) struct ConnectionTracker {
    active: Mutex<usize>,
    idle: Condvar,
}

impl ConnectionTracker {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers one in-flight connection. The count drops when the guard
    /// does, including while unwinding.
    pub(crate) fn track(self: &Arc<Self>) -> InFlight {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        *active += 1;
        InFlight {
            tracker: Arc::clone(self),
        }
    }

    pub(crate) fn in_flight(&self) -> usize {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until no connection is in flight.
    pub(crate) fn wait_idle(&self) {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let _idle = self
            .idle
            .wait_while(active, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    fn release(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.idle.notify_all();
        }
    }
}

/// Guard held by a connection thread for its whole lifetime.
#[derive(Debug)]
pub(crate) struct InFlight {
    tracker: Arc<ConnectionTracker>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.tracker.release();
    }
}
