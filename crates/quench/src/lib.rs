//! Quench: task orchestration with upstream event reuse for heavy-ion
//! event generators.
//!
//! This is the facade crate that re-exports the public API of the Quench
//! sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use quench::prelude::*;
//!
//! struct Counter(u64);
//! impl Task for Counter {
//!     fn name(&self) -> &str { "counter" }
//!     fn exec(&mut self, _ctx: &ExecContext<'_>) -> Result<(), TaskError> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//!
//! let mut orchestrator = Orchestrator::new(RunConfig {
//!     events: 10,
//!     reuse: ReuseConfig::every(5),
//!     seed: 42,
//! })
//! .unwrap();
//! orchestrator.add(TaskList::new("analysis").with(Counter(0)));
//! let metrics = orchestrator.run().unwrap();
//! assert_eq!(metrics.events_executed, 10);
//! assert_eq!(metrics.reusing_events, 8);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `quench-core` | IDs, capabilities, lifecycle, event plans, errors |
//! | [`resource`] | `quench-resource` | Shared-resource registry and handles |
//! | [`task`] | `quench-task` | `Task` trait, `TaskList`, tree validation |
//! | [`engine`] | `quench-engine` | Orchestrator, reuse scheduler, seeds, metrics |
//! | [`modules`] | `quench-modules` | Stand-in physics modules and the two-stage hydro pipeline |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`quench-core`).
pub use quench_core as types;

/// Shared resources (`quench-resource`).
///
/// Tasks exchange data through a [`resource::ResourceRegistry`]: one
/// [`resource::Owner`] per key, any number of readers and accumulators.
pub use quench_resource as resource;

/// The task model (`quench-task`).
pub use quench_task as task;

/// Run orchestration (`quench-engine`).
///
/// [`engine::Orchestrator`] drives a task tree through
/// `init → exec × N → finish`, consulting [`engine::ReuseSchedule`] for
/// which events regenerate upstream state.
pub use quench_engine as engine;

/// Stand-in physics modules (`quench-modules`).
pub use quench_modules as modules;

/// Common imports.
///
/// ```rust
/// use quench::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use quench_core::{
        Access, Capability, CycleIndex, EventIndex, Lifecycle, TaskKind, TaskPath,
    };

    // Errors
    pub use quench_core::{ResourceError, TaskError, TaskFailure};

    // Resources
    pub use quench_resource::{Accumulator, Owner, Reader, RegistryError, ResourceRegistry};

    // Tasks
    pub use quench_task::{ExecContext, FinishContext, InitContext, Task, TaskList, TreeError};

    // Engine
    pub use quench_engine::{
        ConfigError, Orchestrator, ReuseConfig, RunConfig, RunError, RunFailure, RunMetrics,
    };
}
