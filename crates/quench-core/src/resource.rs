//! Declarations of shared-resource usage.
//!
//! Tasks report which shared resources they touch, and how, through
//! [`ResourceUse`]. The orchestrator uses these declarations to check
//! ownership and ordering before any task is initialized.

use std::fmt;

/// Registry key naming a shared resource (e.g. `"liquefier"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Create a key from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<String> for ResourceKey {
    fn from(v: String) -> Self {
        Self(v)
    }
}

/// How a task touches a shared resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    /// The single producing task. Publishes snapshots and controls
    /// the resource's contents.
    Own,
    /// Observe-only. Must run after the owner within an event.
    Read,
    /// Accumulate-only contributions (the liquefier case). Must run
    /// before the owner, which consumes the accumulation.
    Accumulate,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Own => write!(f, "own"),
            Self::Read => write!(f, "read"),
            Self::Accumulate => write!(f, "accumulate"),
        }
    }
}

/// One declared `(resource, access)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceUse {
    /// Which resource.
    pub key: ResourceKey,
    /// How it is used.
    pub access: Access,
}

impl ResourceUse {
    /// Shorthand constructor.
    pub fn new(key: impl Into<ResourceKey>, access: Access) -> Self {
        Self {
            key: key.into(),
            access,
        }
    }
}
