//! Termination signals as a [`ShutdownSignal`].

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::info;

use lambda_bridge::{ShutdownError, ShutdownSignal};

use crate::DEMO_TARGET;

/// Blocks until the process receives a termination signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(target: DEMO_TARGET, signal, "shutdown signal received");
        }
        Ok(())
    }
}
