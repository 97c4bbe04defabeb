//! The [`Task`] trait.
//!
//! Tasks are the modular units a run is assembled from: initial-state
//! generators, hydrodynamics, energy-loss modules, writers. They declare
//! their scheduling class, ordering capabilities and shared-resource
//! usage up front, which lets the engine validate the whole tree before
//! anything is initialized.

use quench_core::{Capability, ResourceUse, TaskError, TaskKind};

use crate::context::{ExecContext, FinishContext, InitContext};

/// A unit of work driven through the `init → exec* → finish` lifecycle.
///
/// # Contract
///
/// - `init()` is called exactly once, before any `exec()`.
/// - For every event, exactly one of `exec()` or `reuse()` is called.
///   `reuse()` is only ever called for [`TaskKind::Upstream`] tasks.
/// - `finish()` is called exactly once if `init()` succeeded, even when
///   the run aborts.
/// - `exec()` blocks until the task's work for the event is complete.
/// - Declarations (`kind`, `provides`, `requires`, `resources`,
///   `subtasks`) are read before Init and must not change afterwards.
///
/// Lifecycle ordering is enforced by the composite that owns the task
/// (see [`TaskList`](crate::TaskList)); an out-of-order call is reported
/// as [`TaskError::Lifecycle`] and the task is never invoked.
///
/// # Object safety
///
/// This trait is object-safe; composites store children as
/// `Vec<Box<dyn Task>>`.
///
/// # Examples
///
/// ```
/// use quench_core::{TaskError, TaskKind};
/// use quench_task::{ExecContext, Task};
///
/// struct Counter {
///     events: u64,
/// }
///
/// impl Task for Counter {
///     fn name(&self) -> &str { "counter" }
///
///     fn exec(&mut self, _ctx: &ExecContext<'_>) -> Result<(), TaskError> {
///         self.events += 1;
///         Ok(())
///     }
/// }
///
/// let task = Counter { events: 0 };
/// assert_eq!(task.kind(), TaskKind::Downstream);
/// ```
pub trait Task: Send {
    /// Name used in paths, logs and failure reports. Must be unique
    /// among siblings.
    fn name(&self) -> &str;

    /// Scheduling class. Default: [`TaskKind::Downstream`].
    fn kind(&self) -> TaskKind {
        TaskKind::Downstream
    }

    /// Capabilities this task establishes for tasks that run after it.
    fn provides(&self) -> Vec<Capability> {
        Vec::new()
    }

    /// Capabilities that must be provided by a task running earlier.
    fn requires(&self) -> Vec<Capability> {
        Vec::new()
    }

    /// Shared resources this task touches, with their access mode.
    fn resources(&self) -> Vec<ResourceUse> {
        Vec::new()
    }

    /// Children of a composite task, in execution order. Empty for
    /// leaf tasks.
    fn subtasks(&self) -> Vec<&dyn Task> {
        Vec::new()
    }

    /// One-time initialization. Default: no-op.
    fn init(&mut self, _ctx: &InitContext<'_>) -> Result<(), TaskError> {
        Ok(())
    }

    /// Regenerate this task's output for one event.
    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError>;

    /// Re-emit previously produced state on an event that reuses
    /// upstream output.
    ///
    /// Default: no-op. Resources published on the regenerating event
    /// keep their snapshot, so most upstream tasks need nothing here.
    fn reuse(&mut self, _ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        Ok(())
    }

    /// One-time finalization: flush outputs, release resources.
    /// Default: no-op.
    fn finish(&mut self, _ctx: &FinishContext<'_>) -> Result<(), TaskError> {
        Ok(())
    }
}
