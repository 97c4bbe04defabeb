//! Task lifecycle states and the transitions between them.
//!
//! Every task moves forward through
//! `Uninitialized → Initialized → Executing → Finished` and never back.
//! [`Lifecycle::enter`] is the single place where the legal transitions
//! are encoded; composites call it before forwarding a phase to a child.

use std::error::Error;
use std::fmt;

/// The lifecycle state of a single task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Built but not yet initialized.
    #[default]
    Uninitialized,
    /// `init()` succeeded; no event has run yet.
    Initialized,
    /// At least one event has been visited.
    Executing,
    /// `finish()` has been called (successfully or not).
    Finished,
}

/// A lifecycle phase a caller wants to drive a task into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// One-time initialization.
    Init,
    /// Per-event execution (including reuse visits).
    Exec,
    /// One-time finalization.
    Finish,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initialized => write!(f, "initialized"),
            Self::Executing => write!(f, "executing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Exec => write!(f, "exec"),
            Self::Finish => write!(f, "finish"),
        }
    }
}

/// A phase was requested from a state that does not allow it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecycleError {
    /// The phase that was requested.
    pub phase: Phase,
    /// The state the task was in.
    pub state: Lifecycle,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot enter {} phase while {}", self.phase, self.state)
    }
}

impl Error for LifecycleError {}

impl Lifecycle {
    /// Compute the state after entering `phase`.
    ///
    /// - `Init` is legal only from `Uninitialized`.
    /// - `Exec` is legal from `Initialized` or `Executing`.
    /// - `Finish` is legal from `Initialized` or `Executing`.
    pub fn enter(self, phase: Phase) -> Result<Lifecycle, LifecycleError> {
        match (phase, self) {
            (Phase::Init, Self::Uninitialized) => Ok(Self::Initialized),
            (Phase::Exec, Self::Initialized | Self::Executing) => Ok(Self::Executing),
            (Phase::Finish, Self::Initialized | Self::Executing) => Ok(Self::Finished),
            (phase, state) => Err(LifecycleError { phase, state }),
        }
    }

    /// Whether the task holds initialized resources that a finish pass
    /// must release.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Initialized | Self::Executing)
    }
}
