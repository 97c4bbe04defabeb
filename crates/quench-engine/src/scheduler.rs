//! The event-reuse scheduler.
//!
//! [`ReuseSchedule`] decides, for each event index, whether upstream
//! tasks regenerate and which seeds the event uses. With an effective
//! period K, event `e` belongs to cycle `e / K` and regenerates upstream
//! state iff `e % K == 0`. Event 0 therefore always regenerates.

use std::num::NonZeroU64;

use quench_core::{CycleIndex, EventIndex, EventPlan};

use crate::config::{ConfigError, RunConfig};
use crate::seed;

/// Per-event scheduling decisions for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReuseSchedule {
    period: NonZeroU64,
    seed: u64,
}

impl ReuseSchedule {
    /// Build the schedule for `config`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidReusePeriod`] if reuse is enabled with a
    /// period of zero.
    pub fn new(config: &RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let period = config.reuse.effective_period();
        let period =
            NonZeroU64::new(period).ok_or(ConfigError::InvalidReusePeriod { period })?;
        Ok(Self {
            period,
            seed: config.seed,
        })
    }

    /// Effective reuse period (1 when reuse is disabled).
    pub fn period(&self) -> u64 {
        self.period.get()
    }

    /// The plan for `event`.
    pub fn plan(&self, event: EventIndex) -> EventPlan {
        let k = self.period.get();
        let cycle = CycleIndex(event.0 / k);
        EventPlan {
            event,
            cycle,
            regenerate_upstream: event.0 % k == 0,
            event_seed: seed::event_seed(self.seed, event),
            cycle_seed: seed::cycle_seed(self.seed, cycle),
        }
    }

    /// Number of reuse cycles touched by the first `n` events.
    pub fn cycles(&self, n: u64) -> u64 {
        n.div_ceil(self.period.get())
    }

    /// Events among the first `n` on which upstream tasks regenerate.
    pub fn regeneration_events(&self, n: u64) -> impl Iterator<Item = EventIndex> {
        let k = self.period.get();
        (0..self.cycles(n)).map(move |c| EventIndex(c * k))
    }
}
