//! Run orchestration for Quench.
//!
//! The [`Orchestrator`] owns the task tree and the shared resource
//! registry, validates the tree once at Init, and then drives every
//! event through the tree as planned by the [`ReuseSchedule`].
//! Finalization is best-effort and always runs for initialized tasks,
//! including after an aborting failure.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod scheduler;
pub mod seed;

pub use config::{ConfigError, ReuseConfig, RunConfig};
pub use metrics::{EventMetrics, RunMetrics};
pub use orchestrator::{Orchestrator, RunError, RunFailure};
pub use scheduler::ReuseSchedule;
