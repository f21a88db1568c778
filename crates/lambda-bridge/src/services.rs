//! Explicit service registry used to wire handler dependencies.
//!
//! Handlers pull what they need by name during [`Handler::inject`]; lookups
//! are typed, so a service registered under the right name but with the wrong
//! type is reported rather than silently ignored.
//!
//! [`Handler::inject`]: crate::Handler::inject

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while registering or resolving services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// No service was registered under the requested name.
    #[error("no service registered for key {name}")]
    Missing {
        /// Requested service name.
        name: String,
    },
    /// A service exists under the name but has a different type.
    #[error("service {name} is not of type {expected}")]
    TypeMismatch {
        /// Requested service name.
        name: String,
        /// Type the caller asked for.
        expected: &'static str,
    },
    /// A service was already registered under the name.
    #[error("duplicate service key {name}")]
    Duplicate {
        /// Conflicting service name.
        name: String,
    },
}

/// Name-keyed, type-checked service registry.
#[derive(Default)]
pub struct ServiceContainer {
    services: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ServiceContainer {
    /// Builds an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` under `name`.
    pub fn set<T>(&mut self, name: impl Into<String>, value: T) -> Result<(), ServiceError>
    where
        T: Any + Send + Sync,
    {
        self.set_shared(name, Arc::new(value))
    }

    /// Registers an already shared value under `name`.
    pub fn set_shared<T>(&mut self, name: impl Into<String>, value: Arc<T>) -> Result<(), ServiceError>
    where
        T: Any + Send + Sync,
    {
        let key = name.into();
        if self.services.contains_key(&key) {
            return Err(ServiceError::Duplicate { name: key });
        }
        self.services.insert(key, value);
        Ok(())
    }

    /// Resolves the service registered under `name` as a `T`.
    pub fn get<T>(&self, name: &str) -> Result<Arc<T>, ServiceError>
    where
        T: Any + Send + Sync,
    {
        let service = self
            .services
            .get(name)
            .ok_or_else(|| ServiceError::Missing {
                name: name.to_owned(),
            })?;
        Arc::clone(service)
            .downcast::<T>()
            .map_err(|_| ServiceError::TypeMismatch {
                name: name.to_owned(),
                expected: type_name::<T>(),
            })
    }

    /// Returns `true` when a service is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        formatter
            .debug_struct("ServiceContainer")
            .field("services", &names)
            .finish()
    }
}
