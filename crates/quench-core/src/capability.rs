//! Ordering capabilities.
//!
//! A task may declare that it *provides* a capability (for example, the
//! module that assigns parton virtuality) and that it *requires* one.
//! The orchestrator checks before Init that every requirement is met by
//! a provider placed earlier in execution order.

use std::fmt;

/// A named ordering contract between tasks.
///
/// Capabilities are compared by name. Define them as constants next to
/// the modules that provide them:
///
/// ```
/// use quench_core::Capability;
///
/// pub const VIRTUALITY: Capability = Capability::new("virtuality");
/// assert_eq!(VIRTUALITY.name(), "virtuality");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capability(&'static str);

impl Capability {
    /// Create a capability with the given name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The capability's name.
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
