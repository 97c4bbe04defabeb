//! Run configuration, validation, and error types.
//!
//! [`RunConfig`] is the input for constructing an
//! [`Orchestrator`](crate::Orchestrator). [`validate()`](RunConfig::validate)
//! checks the numeric settings up front; the task tree itself is checked
//! by [`validate_tree`](quench_task::validate_tree) when the run is
//! initialized, and its errors are reported through [`ConfigError::Tree`].

use std::error::Error;
use std::fmt;

use quench_resource::RegistryError;
use quench_task::TreeError;

// ── ReuseConfig ────────────────────────────────────────────────────

/// Upstream event-reuse settings.
///
/// With reuse enabled, upstream tasks regenerate only on events whose
/// index is a multiple of `period`; the events in between re-run only the
/// downstream tasks on top of the last upstream state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReuseConfig {
    /// Whether upstream state may be reused. Default: `false`.
    pub enabled: bool,
    /// Events per reuse cycle. Must be at least 1 when `enabled`.
    /// Ignored otherwise. Default: 1.
    pub period: u64,
}

impl ReuseConfig {
    /// Reuse disabled: every event regenerates everything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            period: 1,
        }
    }

    /// Regenerate upstream state every `period` events.
    pub fn every(period: u64) -> Self {
        Self {
            enabled: true,
            period,
        }
    }

    /// The period the scheduler actually uses: `period` when enabled,
    /// 1 otherwise.
    pub fn effective_period(&self) -> u64 {
        if self.enabled {
            self.period
        } else {
            1
        }
    }
}

impl Default for ReuseConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected before any event executes.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The task tree failed structural validation.
    Tree(TreeError),
    /// A shared resource could not be registered or attached.
    Registry(RegistryError),
    /// Reuse is enabled with a period of zero.
    InvalidReusePeriod {
        /// The configured period.
        period: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(e) => write!(f, "task tree: {e}"),
            Self::Registry(e) => write!(f, "resources: {e}"),
            Self::InvalidReusePeriod { period } => {
                write!(f, "reuse period must be at least 1 when reuse is enabled, got {period}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::InvalidReusePeriod { .. } => None,
        }
    }
}

impl From<TreeError> for ConfigError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

impl From<RegistryError> for ConfigError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ── RunConfig ──────────────────────────────────────────────────────

/// Complete configuration of one run.
///
/// Per-module parameters are constructor arguments of the modules and
/// are not part of this struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of events to execute. Zero runs Init and Finish only.
    /// Default: 1.
    pub events: u64,
    /// Upstream reuse settings.
    pub reuse: ReuseConfig,
    /// Master seed. Per-event and per-cycle seeds are derived from it.
    /// Default: 0.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            events: 1,
            reuse: ReuseConfig::default(),
            seed: 0,
        }
    }
}

impl RunConfig {
    /// Validate the numeric settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reuse.enabled && self.reuse.period == 0 {
            return Err(ConfigError::InvalidReusePeriod {
                period: self.reuse.period,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quench_core::TaskPath;

    #[test]
    fn default_config_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.events, 1);
        assert!(!config.reuse.enabled);
    }

    #[test]
    fn zero_period_rejected_only_when_enabled() {
        let mut config = RunConfig {
            events: 10,
            reuse: ReuseConfig::every(0),
            seed: 1,
        };
        match config.validate() {
            Err(ConfigError::InvalidReusePeriod { period }) => assert_eq!(period, 0),
            other => panic!("expected InvalidReusePeriod, got {other:?}"),
        }
        config.reuse.enabled = false;
        assert!(config.validate().is_ok());
        assert_eq!(config.reuse.effective_period(), 1);
    }

    #[test]
    fn effective_period_follows_flag() {
        assert_eq!(ReuseConfig::every(5).effective_period(), 5);
        assert_eq!(ReuseConfig::disabled().effective_period(), 1);
    }

    #[test]
    fn tree_error_is_source() {
        let err = ConfigError::from(TreeError::DuplicateSibling {
            path: TaskPath::from_segment("music"),
        });
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("task tree:"));
    }
}
