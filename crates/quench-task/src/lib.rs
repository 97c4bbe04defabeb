//! Task trait, composite task lists, and tree validation for Quench.
//!
//! The [`Task`] trait is the lifecycle contract every simulation module
//! implements. [`TaskList`] is the composite: it owns an ordered list of
//! children and drives their lifecycle recursively, so managers and
//! groups nest to any depth. [`validate_tree`] runs once before Init to
//! check ordering capabilities, shared-resource usage, and sink
//! placement.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod list;
pub mod task;
pub mod validate;

pub use context::{ExecContext, FinishContext, InitContext};
pub use list::{TaskList, Visit};
pub use task::Task;
pub use validate::{validate_tree, PlannedTask, TreeError, TreePlan};
