//! The composite task: an ordered list of children.
//!
//! [`TaskList`] is how managers and groups are built. It implements
//! [`Task`] itself, so lists nest to arbitrary depth
//! (root → energy-loss manager → energy-loss group → modules).
//!
//! # Ordering
//!
//! - `init` and `exec` visit children in insertion order.
//! - `finish` visits children in reverse insertion order, mirroring
//!   acquisition with teardown, and is best-effort: every eligible child
//!   is finished even if a sibling fails.
//!
//! Insertion order *is* execution order. The list never reorders; the
//! caller states the order and [`validate_tree`](crate::validate_tree)
//! checks it.

use std::fmt;
use std::time::{Duration, Instant};

use quench_core::{Lifecycle, Phase, TaskError};
use tracing::{debug, trace};

use crate::context::{ExecContext, FinishContext, InitContext};
use crate::task::Task;

/// One child visit during an event, reported to
/// [`TaskList::exec_observed`] observers.
#[derive(Clone, Copy, Debug)]
pub struct Visit<'a> {
    /// The child's name.
    pub name: &'a str,
    /// `true` if `exec()` ran, `false` if `reuse()` ran.
    pub regenerated: bool,
    /// Wall time spent in the call.
    pub elapsed: Duration,
}

struct Slot {
    task: Box<dyn Task>,
    state: Lifecycle,
    /// `init()` was called and returned an error. A composite in this
    /// state may still hold initialized children, so it is offered a
    /// `finish()` call.
    init_failed: bool,
}

/// An ordered composite of child tasks.
pub struct TaskList {
    name: String,
    slots: Vec<Slot>,
}

impl TaskList {
    /// Create an empty list.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
        }
    }

    /// Append a child (builder form).
    pub fn with(mut self, task: impl Task + 'static) -> Self {
        self.add(task);
        self
    }

    /// Append a child. It runs after every child added before it.
    pub fn add(&mut self, task: impl Task + 'static) {
        self.add_boxed(Box::new(task));
    }

    /// Append an already-boxed child.
    pub fn add_boxed(&mut self, task: Box<dyn Task>) {
        self.slots.push(Slot {
            task,
            state: Lifecycle::Uninitialized,
            init_failed: false,
        });
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the list has no children.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Lifecycle state of the child at `index`.
    pub fn state_of(&self, index: usize) -> Option<Lifecycle> {
        self.slots.get(index).map(|s| s.state)
    }

    /// `(name, state)` of every direct child, in insertion order.
    pub fn states(&self) -> impl Iterator<Item = (&str, Lifecycle)> {
        self.slots.iter().map(|s| (s.task.name(), s.state))
    }

    /// Run one event, reporting every child visit to `observer`.
    ///
    /// Upstream children are sent to `reuse()` instead of `exec()` when
    /// the event does not regenerate upstream state. Stops at the first
    /// failure; the error is wrapped with the failing child's name.
    pub fn exec_observed(
        &mut self,
        ctx: &ExecContext<'_>,
        observer: &mut dyn FnMut(&Visit<'_>),
    ) -> Result<(), TaskError> {
        for slot in &mut self.slots {
            slot.state = slot
                .state
                .enter(Phase::Exec)
                .map_err(|e| TaskError::from(e).within(slot.task.name()))?;

            let regenerate = ctx.plan().regenerates(slot.task.kind());
            trace!(
                task = slot.task.name(),
                event = %ctx.event(),
                regenerate,
                "visiting task"
            );

            let start = Instant::now();
            let result = if regenerate {
                slot.task.exec(ctx)
            } else {
                slot.task.reuse(ctx)
            };
            if let Err(e) = result {
                return Err(e.within(slot.task.name()));
            }

            observer(&Visit {
                name: slot.task.name(),
                regenerated: regenerate,
                elapsed: start.elapsed(),
            });
        }
        Ok(())
    }
}

impl Task for TaskList {
    fn name(&self) -> &str {
        &self.name
    }

    fn subtasks(&self) -> Vec<&dyn Task> {
        self.slots.iter().map(|s| s.task.as_ref()).collect()
    }

    /// Initialize children in insertion order. Stops at the first
    /// failure; children after it stay `Uninitialized`.
    fn init(&mut self, ctx: &InitContext<'_>) -> Result<(), TaskError> {
        for slot in &mut self.slots {
            let next = slot
                .state
                .enter(Phase::Init)
                .map_err(|e| TaskError::from(e).within(slot.task.name()))?;
            trace!(task = slot.task.name(), "initializing task");
            if let Err(e) = slot.task.init(ctx) {
                slot.init_failed = true;
                return Err(e.within(slot.task.name()));
            }
            slot.state = next;
        }
        Ok(())
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        self.exec_observed(ctx, &mut |_| {})
    }

    /// Finish children in reverse order, best-effort.
    ///
    /// Every live child is finished regardless of sibling failures. All
    /// failures are returned together as [`TaskError::Finalize`], with
    /// paths relative to this list.
    fn finish(&mut self, ctx: &FinishContext<'_>) -> Result<(), TaskError> {
        let mut failures = Vec::new();
        for slot in self.slots.iter_mut().rev() {
            let partial_composite = slot.init_failed && !slot.task.subtasks().is_empty();
            if !slot.state.is_live() && !partial_composite {
                continue;
            }
            slot.state = Lifecycle::Finished;
            trace!(task = slot.task.name(), "finishing task");
            if let Err(e) = slot.task.finish(ctx) {
                debug!(task = slot.task.name(), error = %e, "task failed to finish");
                failures.extend(e.within(slot.task.name()).into_failures());
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TaskError::Finalize(failures))
        }
    }
}

impl fmt::Debug for TaskList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskList")
            .field("name", &self.name)
            .field("children", &self.states().collect::<Vec<_>>())
            .finish()
    }
}
