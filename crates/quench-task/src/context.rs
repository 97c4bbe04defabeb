//! Per-phase contexts passed to [`Task`](crate::Task) lifecycle calls.

use quench_core::{CycleIndex, EventIndex, EventPlan, RunInfo, TaskKind};

/// Context for [`Task::init`](crate::Task::init).
#[derive(Clone, Copy, Debug)]
pub struct InitContext<'a> {
    run: &'a RunInfo,
}

impl<'a> InitContext<'a> {
    /// Create an init context.
    pub fn new(run: &'a RunInfo) -> Self {
        Self { run }
    }

    /// Run-level facts.
    pub fn run(&self) -> &RunInfo {
        self.run
    }
}

/// Context for [`Task::exec`](crate::Task::exec) and
/// [`Task::reuse`](crate::Task::reuse).
///
/// Shared read-only by every task visited during one event.
#[derive(Clone, Copy, Debug)]
pub struct ExecContext<'a> {
    run: &'a RunInfo,
    plan: &'a EventPlan,
}

impl<'a> ExecContext<'a> {
    /// Create an exec context for one event.
    pub fn new(run: &'a RunInfo, plan: &'a EventPlan) -> Self {
        Self { run, plan }
    }

    /// Run-level facts.
    pub fn run(&self) -> &RunInfo {
        self.run
    }

    /// The scheduler's decision for this event.
    pub fn plan(&self) -> &EventPlan {
        self.plan
    }

    /// Zero-based event index.
    pub fn event(&self) -> EventIndex {
        self.plan.event
    }

    /// Reuse cycle of this event.
    pub fn cycle(&self) -> CycleIndex {
        self.plan.cycle
    }

    /// Whether upstream tasks regenerate on this event.
    pub fn regenerate_upstream(&self) -> bool {
        self.plan.regenerate_upstream
    }

    /// The seed a task of `kind` must draw its random numbers from.
    ///
    /// Upstream tasks get the cycle seed so a regenerated upstream state
    /// is a pure function of (run seed, cycle). Everything else gets a
    /// fresh per-event seed.
    pub fn seed_for(&self, kind: TaskKind) -> u64 {
        self.plan.seed_for(kind)
    }
}

/// Context for [`Task::finish`](crate::Task::finish).
#[derive(Clone, Copy, Debug)]
pub struct FinishContext<'a> {
    run: &'a RunInfo,
    events_executed: u64,
    aborted: bool,
}

impl<'a> FinishContext<'a> {
    /// Create a finish context.
    pub fn new(run: &'a RunInfo, events_executed: u64, aborted: bool) -> Self {
        Self {
            run,
            events_executed,
            aborted,
        }
    }

    /// Run-level facts.
    pub fn run(&self) -> &RunInfo {
        self.run
    }

    /// Number of events that completed successfully.
    pub fn events_executed(&self) -> u64 {
        self.events_executed
    }

    /// Whether the run stopped early because of a failure.
    pub fn aborted(&self) -> bool {
        self.aborted
    }
}
