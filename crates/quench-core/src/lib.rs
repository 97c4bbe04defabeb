//! Core types and errors for the Quench task orchestration engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: event
//! and cycle indices, task paths, lifecycle states, ordering
//! capabilities, resource usage declarations, and the error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod capability;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod plan;
pub mod resource;

pub use capability::Capability;
pub use error::{ResourceError, TaskError, TaskFailure};
pub use id::{CycleIndex, EventIndex, TaskPath};
pub use lifecycle::{Lifecycle, LifecycleError, Phase};
pub use plan::{EventPlan, RunInfo, TaskKind};
pub use resource::{Access, ResourceKey, ResourceUse};
