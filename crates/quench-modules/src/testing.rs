//! Context builders for module unit tests.

use quench_core::{CycleIndex, EventIndex, EventPlan, RunInfo};

pub(crate) const RUN: RunInfo = RunInfo {
    total_events: 4,
    reuse_period: 2,
    seed: 99,
};

pub(crate) fn plan(event: u64) -> EventPlan {
    EventPlan {
        event: EventIndex(event),
        cycle: CycleIndex(event / 2),
        regenerate_upstream: event % 2 == 0,
        event_seed: 1000 + event,
        cycle_seed: 2000 + event / 2,
    }
}
