//! Build-phase errors from the resource registry.

use std::error::Error;
use std::fmt;

use quench_core::ResourceKey;

/// Errors from registering or attaching a shared resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A resource with this key already exists.
    DuplicateKey {
        /// The contested key.
        key: ResourceKey,
    },
    /// No resource with this key has been registered.
    UnknownKey {
        /// The missing key.
        key: ResourceKey,
    },
    /// The resource exists but holds a different type.
    TypeMismatch {
        /// The resource key.
        key: ResourceKey,
        /// Type requested by the caller.
        expected: &'static str,
        /// Type the resource was registered with.
        actual: &'static str,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { key } => write!(f, "resource '{key}' is already registered"),
            Self::UnknownKey { key } => write!(f, "no resource registered under '{key}'"),
            Self::TypeMismatch {
                key,
                expected,
                actual,
            } => write!(
                f,
                "resource '{key}' holds {actual}, but {expected} was requested"
            ),
        }
    }
}

impl Error for RegistryError {}
