//! Demo binary wiring a stream-record handler into an invocation server.
//!
//! The process loads configuration (`LAMBDA_*` environment, optional config
//! file, CLI flags), installs the JSON subscriber, serves invocations until a
//! termination signal arrives, then stops and drains the server.

mod records;
mod shutdown;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use lambda_bridge::events::Stream;
use lambda_bridge::{
    BootstrapError, ConfigLoader, InvocationServer, ServerError, ShutdownSignal,
    StaticConfigLoader, SuperviseError, SystemConfigLoader, bootstrap_with, record_server,
    supervise,
};

pub use records::DataLogger;
pub use shutdown::SystemShutdownSignal;

pub(crate) const DEMO_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::demo");

/// Failures that end the demo process.
#[derive(Debug, Error)]
pub enum DemoError {
    /// Configuration or telemetry could not be prepared.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The server failed to initialise.
    #[error("failed to start invocation server: {0}")]
    Server(#[from] ServerError),
    /// The server failed while running or stopping.
    #[error(transparent)]
    Supervise(#[from] SuperviseError),
}

/// Runs the demo with the system loader and signal listener, reporting
/// failures on `stderr`.
pub fn run<W: Write>(stderr: &mut W) -> ExitCode {
    match serve(&SystemConfigLoader, Arc::new(SystemShutdownSignal)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "lambda-bridge-demo: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Boots, serves until `signal` fires, then drains.
pub fn serve(
    loader: &dyn ConfigLoader,
    signal: Arc<dyn ShutdownSignal>,
) -> Result<(), DemoError> {
    let bootstrapped = bootstrap_with(loader)?;
    let mut server = record_server::<Stream, _>(DataLogger).with_config_loader(Arc::new(
        StaticConfigLoader::new(bootstrapped.config().clone()),
    ));
    server.init()?;
    if let Some(addr) = server.local_addr() {
        info!(target: DEMO_TARGET, address = %addr, "demo server listening");
    }

    let shared: Arc<InvocationServer> = Arc::new(server);
    supervise(&shared, signal)?;
    Ok(())
}
