//! Error types shared by tasks and composites.
//!
//! [`TaskError`] is what a task returns from any lifecycle call.
//! Composites wrap child errors in [`TaskError::Subtask`] so the path to
//! the failing leaf survives the trip up the tree; the orchestrator
//! flattens the chain into [`TaskFailure`]s for reporting.

use std::error::Error;
use std::fmt;

use crate::id::TaskPath;
use crate::lifecycle::LifecycleError;
use crate::resource::ResourceKey;

/// Errors from accessing a shared resource through a handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceError {
    /// The registry holding the resource has been dropped.
    Released {
        /// The resource that is gone.
        key: ResourceKey,
    },
    /// A task panicked while holding the resource lock.
    Poisoned {
        /// The affected resource.
        key: ResourceKey,
    },
    /// The owner has not published a snapshot yet.
    NotPublished {
        /// The resource that was read too early.
        key: ResourceKey,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Released { key } => write!(f, "resource '{key}' has been released"),
            Self::Poisoned { key } => write!(f, "resource '{key}' lock is poisoned"),
            Self::NotPublished { key } => {
                write!(f, "resource '{key}' has not been published yet")
            }
        }
    }
}

impl Error for ResourceError {}

/// Errors returned by a task's lifecycle calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskError {
    /// The task's own work failed (numerical divergence, resource
    /// exhaustion, bad input data).
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// Accessing a shared resource failed.
    Resource(ResourceError),
    /// A lifecycle call arrived out of order.
    Lifecycle(LifecycleError),
    /// A child of a composite failed. `task` is the child's name.
    Subtask {
        /// Name of the failing child.
        task: String,
        /// The child's error.
        source: Box<TaskError>,
    },
    /// One or more tasks failed during a best-effort finish pass.
    ///
    /// Paths are relative to the composite that produced the error.
    Finalize(Vec<TaskFailure>),
}

impl TaskError {
    /// Shorthand for [`TaskError::ExecutionFailed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            reason: reason.into(),
        }
    }

    /// Wrap this error as coming from the child named `task`.
    pub fn within(self, task: impl Into<String>) -> Self {
        Self::Subtask {
            task: task.into(),
            source: Box::new(self),
        }
    }

    /// Unwind the [`Subtask`](TaskError::Subtask) chain into a path and
    /// the root-cause error.
    ///
    /// A [`Finalize`](TaskError::Finalize) set at the bottom of the chain
    /// yields one failure per member, each prefixed with the unwound path.
    pub fn into_failures(self) -> Vec<TaskFailure> {
        let mut prefix = TaskPath::root();
        let mut current = self;
        loop {
            match current {
                Self::Subtask { task, source } => {
                    prefix = prefix.child(task);
                    current = *source;
                }
                Self::Finalize(failures) => {
                    return failures
                        .into_iter()
                        .map(|mut failure| {
                            failure.path =
                                prefix.segments().chain(failure.path.segments()).collect();
                            failure
                        })
                        .collect();
                }
                error => return vec![TaskFailure { path: prefix, error }],
            }
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::Resource(e) => write!(f, "resource: {e}"),
            Self::Lifecycle(e) => write!(f, "lifecycle: {e}"),
            Self::Subtask { task, source } => write!(f, "task '{task}': {source}"),
            Self::Finalize(failures) => {
                write!(f, "{} task(s) failed to finish: ", failures.len())?;
                for (i, failure) in failures.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{failure}")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Resource(e) => Some(e),
            Self::Lifecycle(e) => Some(e),
            Self::Subtask { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<ResourceError> for TaskError {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}

impl From<LifecycleError> for TaskError {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

/// A task error paired with the path of the task that raised it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskFailure {
    /// Path from the reporting composite to the failing task.
    pub path: TaskPath,
    /// The root-cause error.
    pub error: TaskError,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

impl Error for TaskFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}
