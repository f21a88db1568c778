//! Errors reported by the invocation server lifecycle.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use bridge_config::ConfigValidationError;

use super::ServerState;
use crate::handler::BoxError;
use crate::health::HealthError;
use crate::services::ServiceError;
use crate::transport::ListenerError;

/// Failures raised by [`InvocationServer`](crate::InvocationServer).
#[derive(Debug, Error)]
pub enum ServerError {
    /// The health token could not be registered.
    #[error("failed to register health token: {0}")]
    Health(#[from] HealthError),
    /// Configuration failed to load.
    #[error("failed to load configuration: {0}")]
    Configuration(#[source] Arc<OrthoError>),
    /// Configuration loaded but holds unusable values.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigValidationError),
    /// The handler could not resolve a dependency.
    #[error("failed to inject handler dependencies: {0}")]
    Injection(#[from] ServiceError),
    /// The handler's own initialisation failed; shown verbatim.
    #[error(transparent)]
    HandlerInit(BoxError),
    /// Binding or accepting on the listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// The operation is not valid in the current lifecycle phase.
    #[error("server is {actual}, expected {expected}")]
    InvalidState {
        /// Phase the operation requires.
        expected: ServerState,
        /// Phase observed.
        actual: ServerState,
    },
    /// `stop` was called before `init` completed.
    #[error("server was stopped before initialisation")]
    Closed,
}
