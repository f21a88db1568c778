//! Readiness reporting for long-running components.
//!
//! A component registers a [`HealthToken`] once with a [`HealthRegistrar`]
//! and receives a [`HealthStatus`] handle it alone updates. [`Health`] is the
//! in-process registrar; supervisors with their own health endpoint can plug
//! in a different implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use uuid::Uuid;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Opaque identity of a component within a health registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HealthToken(String);

impl HealthToken {
    /// Generates a fresh random token.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrows the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HealthToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Errors raised while registering with a health registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthError {
    /// The token was registered before.
    #[error("health token {token} is already registered")]
    AlreadyRegistered {
        /// Conflicting token.
        token: HealthToken,
    },
}

/// Handle used by a registered component to publish its readiness.
pub trait HealthStatus: Send + Sync {
    /// Records whether the component is ready.
    fn update(&self, healthy: bool);
}

/// Registry components enrol with before reporting readiness.
pub trait HealthRegistrar: Send + Sync {
    /// Registers `token`, returning the handle used for later updates.
    fn register(&self, token: &HealthToken) -> Result<Arc<dyn HealthStatus>, HealthError>;
}

impl<T> HealthRegistrar for Arc<T>
where
    T: HealthRegistrar,
{
    fn register(&self, token: &HealthToken) -> Result<Arc<dyn HealthStatus>, HealthError> {
        (**self).register(token)
    }
}

type Components = Arc<Mutex<HashMap<HealthToken, bool>>>;

/// In-process registry; healthy once every registered component is ready.
/// An empty registry is not healthy.
#[derive(Debug, Clone, Default)]
pub struct Health {
    components: Components,
}

impl Health {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when at least one component registered and every
    /// registered component reported ready.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        let components = self
            .components
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        !components.is_empty() && components.values().all(|healthy| *healthy)
    }

    /// Readiness of a single component, if registered.
    #[must_use]
    pub fn status_of(&self, token: &HealthToken) -> Option<bool> {
        let components = self
            .components
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        components.get(token).copied()
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when nothing has registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HealthRegistrar for Health {
    fn register(&self, token: &HealthToken) -> Result<Arc<dyn HealthStatus>, HealthError> {
        let mut components = self
            .components
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if components.contains_key(token) {
            return Err(HealthError::AlreadyRegistered {
                token: token.clone(),
            });
        }
        components.insert(token.clone(), false);
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "component_registered",
            token = %token,
            "health component registered"
        );
        Ok(Arc::new(ComponentStatus {
            token: token.clone(),
            components: Arc::clone(&self.components),
        }))
    }
}

struct ComponentStatus {
    token: HealthToken,
    components: Components,
}

impl HealthStatus for ComponentStatus {
    fn update(&self, healthy: bool) {
        let mut components = self
            .components
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        components.insert(self.token.clone(), healthy);
        tracing::info!(
            target: HEALTH_TARGET,
            event = "component_updated",
            token = %self.token,
            healthy,
            "health component updated"
        );
    }
}
