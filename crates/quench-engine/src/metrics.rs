//! Run and per-event timing metrics.
//!
//! [`EventMetrics`] captures one event; [`RunMetrics`] accumulates the
//! whole run, including per-phase wall time for the end-of-run summary.

use indexmap::IndexMap;

/// Timing collected during a single event.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default)]
pub struct EventMetrics {
    /// Zero-based event index.
    pub event: u64,
    /// Wall-clock time for the whole event, in microseconds.
    pub total_us: u64,
    /// Whether upstream tasks regenerated on this event.
    pub regenerated_upstream: bool,
    /// Per-top-level-task time: `(name, microseconds)`, in visit order.
    pub task_us: Vec<(String, u64)>,
    /// Number of top-level tasks that ran `reuse()` instead of `exec()`.
    pub reused_tasks: u32,
}

/// Timing and counters accumulated over a run.
#[derive(Clone, Debug, Default)]
pub struct RunMetrics {
    /// Wall time of the Init phase (validation included), in microseconds.
    pub init_us: u64,
    /// Wall time of all executed events, in microseconds.
    pub exec_us: u64,
    /// Wall time of the Finish phase, in microseconds.
    pub finish_us: u64,
    /// Events that completed successfully.
    pub events_executed: u64,
    /// Completed events on which upstream tasks regenerated.
    pub regenerating_events: u64,
    /// Completed events that reused upstream state.
    pub reusing_events: u64,
    /// Cumulative time per top-level task, in first-visit order.
    pub task_us: IndexMap<String, u64>,
    /// Metrics of the most recent completed event.
    pub last_event: Option<EventMetrics>,
}

impl RunMetrics {
    /// Fold one completed event into the run totals.
    pub fn record_event(&mut self, event: EventMetrics) {
        self.exec_us += event.total_us;
        self.events_executed += 1;
        if event.regenerated_upstream {
            self.regenerating_events += 1;
        } else {
            self.reusing_events += 1;
        }
        for (name, us) in &event.task_us {
            *self.task_us.entry(name.clone()).or_default() += us;
        }
        self.last_event = Some(event);
    }

    /// Init + exec + finish, in microseconds.
    pub fn total_us(&self) -> u64 {
        self.init_us + self.exec_us + self.finish_us
    }

    /// Mean wall time per completed event, in microseconds.
    pub fn mean_event_us(&self) -> Option<u64> {
        self.exec_us.checked_div(self.events_executed)
    }
}
