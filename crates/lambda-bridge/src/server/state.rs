//! Monotonic lifecycle state shared between `run` and `stop`.

use std::sync::atomic::{AtomicU8, Ordering};

use strum::Display;

/// Lifecycle phase of an [`InvocationServer`](crate::InvocationServer).
///
/// Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum ServerState {
    /// Constructed; `init` has not succeeded yet.
    Created = 0,
    /// Listener bound and handler registered.
    Initialized = 1,
    /// Accept loop active.
    Running = 2,
    /// Accept loop finished; waiting for in-flight connections.
    Draining = 3,
    /// Fully stopped.
    Stopped = 4,
}

impl ServerState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Initialized,
            2 => Self::Running,
            3 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

#[derive(Debug)]
pub(super) struct StateCell(AtomicU8);

impl StateCell {
    pub(super) const fn new() -> Self {
        Self(AtomicU8::new(ServerState::Created as u8))
    }

    pub(super) fn get(&self) -> ServerState {
        ServerState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Moves from `from` to `to`, returning the observed state on mismatch.
    pub(super) fn transition(&self, from: ServerState, to: ServerState) -> Result<(), ServerState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(ServerState::from_u8)
    }

    /// Moves forward to `to`; backwards moves are ignored.
    pub(super) fn advance(&self, to: ServerState) {
        self.0.fetch_max(to as u8, Ordering::SeqCst);
    }
}
