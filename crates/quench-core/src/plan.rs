//! Per-event scheduling decisions and run-level facts handed to tasks.

use crate::id::{CycleIndex, EventIndex};

/// Scheduling class of a task.
///
/// The engine distinguishes tasks only by this behavior tag, never by
/// concrete type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Expensive stage eligible for reuse (initial state, pre-dynamics,
    /// hydrodynamic evolution). Regenerated only on the first event of
    /// each reuse cycle; otherwise re-emits its previous state.
    Upstream,
    /// Regenerated on every event.
    #[default]
    Downstream,
    /// Output stage. Regenerated on every event and required to run
    /// after every non-sink task.
    Sink,
}

impl TaskKind {
    /// Whether the scheduler may skip regeneration for this kind.
    pub fn is_reusable(self) -> bool {
        matches!(self, Self::Upstream)
    }
}

/// The scheduler's decision for one event.
///
/// Produced once per event by the engine and shared read-only with
/// every task visited during that event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventPlan {
    /// Zero-based event index.
    pub event: EventIndex,
    /// Reuse cycle the event belongs to.
    pub cycle: CycleIndex,
    /// Whether upstream tasks regenerate on this event.
    pub regenerate_upstream: bool,
    /// Seed for downstream random sampling. Unique per event.
    pub event_seed: u64,
    /// Seed for upstream random sampling. Shared by every event of a
    /// reuse cycle.
    pub cycle_seed: u64,
}

impl EventPlan {
    /// Whether a task of `kind` is regenerated on this event.
    pub fn regenerates(&self, kind: TaskKind) -> bool {
        !kind.is_reusable() || self.regenerate_upstream
    }

    /// The seed a task of `kind` should draw from.
    pub fn seed_for(&self, kind: TaskKind) -> u64 {
        if kind.is_reusable() {
            self.cycle_seed
        } else {
            self.event_seed
        }
    }
}

/// Run-level facts visible to every task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunInfo {
    /// Total number of events requested.
    pub total_events: u64,
    /// Effective reuse period (1 when reuse is disabled).
    pub reuse_period: u64,
    /// Master seed of the run.
    pub seed: u64,
}
