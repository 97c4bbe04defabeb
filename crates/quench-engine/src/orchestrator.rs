//! The run orchestrator.
//!
//! [`Orchestrator`] is the primary user-facing API. It owns the root
//! [`TaskList`] and the [`ResourceRegistry`], and drives the tree
//! through `init → exec × N → finish`.
//!
//! # Ownership model
//!
//! Tasks hold weak handles into the registry. The orchestrator declares
//! the task tree before the registry, so tasks are always dropped first,
//! and `finish()` runs while every resource is still alive.
//!
//! # Failure handling
//!
//! - A structural problem is reported as [`RunError::Config`] before any
//!   task is initialized.
//! - A failing `init()` or `exec()` aborts the run; [`run()`](Orchestrator::run)
//!   still finishes every task that was initialized.
//! - Finish is best-effort and every failure is collected.

use std::error::Error;
use std::fmt;
use std::time::Instant;

use quench_core::{
    EventIndex, Lifecycle, LifecycleError, Phase, RunInfo, TaskError, TaskFailure, TaskPath,
};
use quench_resource::ResourceRegistry;
use quench_task::{
    validate_tree, ExecContext, FinishContext, InitContext, Task, TaskList, TreePlan,
};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, RunConfig};
use crate::metrics::{EventMetrics, RunMetrics};
use crate::scheduler::ReuseSchedule;

// Compile-time assertion: the orchestrator can be moved to another thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Orchestrator>();
    }
};

// ── RunError ───────────────────────────────────────────────────────

/// Errors from the orchestrator's lifecycle methods.
#[derive(Clone, Debug, PartialEq)]
pub enum RunError {
    /// The configuration or task tree is invalid. No task was initialized.
    Config(ConfigError),
    /// An orchestrator method was called out of order.
    Lifecycle(LifecycleError),
    /// A task failed to initialize.
    Init {
        /// The failing task and its error.
        failure: TaskFailure,
    },
    /// A task failed while executing an event.
    EventFailed {
        /// Index of the failing event.
        event: EventIndex,
        /// The failing task and its error.
        failure: TaskFailure,
    },
    /// One or more tasks failed to finish.
    Finish {
        /// Every finish failure, in finish order.
        failures: Vec<TaskFailure>,
    },
    /// An earlier failure aborted the run; only `finish()` may follow.
    Aborted,
}

impl RunError {
    /// Path of the task responsible, if the error came from a task.
    pub fn task(&self) -> Option<&TaskPath> {
        match self {
            Self::Init { failure } | Self::EventFailed { failure, .. } => Some(&failure.path),
            Self::Finish { failures } => failures.first().map(|f| &f.path),
            _ => None,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Lifecycle(e) => write!(f, "orchestrator {e}"),
            Self::Init { failure } => write!(f, "init failed in {failure}"),
            Self::EventFailed { event, failure } => {
                write!(f, "event {event} failed in {failure}")
            }
            Self::Finish { failures } => {
                write!(f, "{} task(s) failed to finish", failures.len())?;
                for failure in failures {
                    write!(f, "; {failure}")?;
                }
                Ok(())
            }
            Self::Aborted => write!(f, "run was aborted by an earlier failure"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Lifecycle(e) => Some(e),
            Self::Init { failure } | Self::EventFailed { failure, .. } => Some(&failure.error),
            _ => None,
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<LifecycleError> for RunError {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

// ── RunFailure ─────────────────────────────────────────────────────

/// Outcome of a failed [`Orchestrator::run`].
///
/// Carries the error that ended the run together with every finish
/// failure that happened afterwards, so nothing is lost to the caller.
#[derive(Clone, Debug)]
pub struct RunFailure {
    /// The error that ended the run. [`RunError::Finish`] when only the
    /// finish pass failed.
    pub error: RunError,
    /// Finish failures that followed `error`. Empty when `error` is
    /// itself [`RunError::Finish`].
    pub finish_failures: Vec<TaskFailure>,
    /// Metrics up to the point of failure.
    pub metrics: RunMetrics,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if !self.finish_failures.is_empty() {
            write!(
                f,
                " (and {} task(s) failed to finish)",
                self.finish_failures.len()
            )?;
        }
        Ok(())
    }
}

impl Error for RunFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

fn primary_failure(error: TaskError) -> TaskFailure {
    let fallback = error.clone();
    error
        .into_failures()
        .into_iter()
        .next()
        .unwrap_or(TaskFailure {
            path: TaskPath::root(),
            error: fallback,
        })
}

// ── Orchestrator ───────────────────────────────────────────────────

/// Drives a task tree through one run.
///
/// # Example
///
/// ```
/// use quench_core::TaskError;
/// use quench_engine::{Orchestrator, ReuseConfig, RunConfig};
/// use quench_task::{ExecContext, Task};
///
/// struct Noop;
/// impl Task for Noop {
///     fn name(&self) -> &str { "noop" }
///     fn exec(&mut self, _ctx: &ExecContext<'_>) -> Result<(), TaskError> { Ok(()) }
/// }
///
/// let config = RunConfig { events: 4, reuse: ReuseConfig::every(2), seed: 1 };
/// let mut orchestrator = Orchestrator::new(config).unwrap();
/// orchestrator.add(Noop);
/// let metrics = orchestrator.run().unwrap();
/// assert_eq!(metrics.events_executed, 4);
/// assert_eq!(metrics.regenerating_events, 2);
/// ```
pub struct Orchestrator {
    // Declared before `registry` so tasks drop first.
    root: TaskList,
    registry: ResourceRegistry,
    config: RunConfig,
    schedule: ReuseSchedule,
    run: RunInfo,
    state: Lifecycle,
    next_event: u64,
    aborted: bool,
    metrics: RunMetrics,
}

impl Orchestrator {
    /// Create an orchestrator with an empty task tree.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidReusePeriod`] if `config` fails validation.
    pub fn new(config: RunConfig) -> Result<Self, ConfigError> {
        let schedule = ReuseSchedule::new(&config)?;
        let run = RunInfo {
            total_events: config.events,
            reuse_period: schedule.period(),
            seed: config.seed,
        };
        Ok(Self {
            root: TaskList::new("root"),
            registry: ResourceRegistry::new(),
            config,
            schedule,
            run,
            state: Lifecycle::Uninitialized,
            next_event: 0,
            aborted: false,
            metrics: RunMetrics::default(),
        })
    }

    /// Append a top-level task.
    pub fn add(&mut self, task: impl Task + 'static) {
        self.root.add(task);
    }

    /// Append an already-boxed top-level task.
    pub fn add_boxed(&mut self, task: Box<dyn Task>) {
        self.root.add_boxed(task);
    }

    /// Append several top-level tasks in order.
    pub fn extend(&mut self, tasks: impl IntoIterator<Item = Box<dyn Task>>) {
        for task in tasks {
            self.root.add_boxed(task);
        }
    }

    /// The registry, for creating resources and handles while building
    /// the tree.
    pub fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    /// The registry.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// The root of the task tree.
    pub fn tasks(&self) -> &TaskList {
        &self.root
    }

    /// The run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run-level facts handed to tasks.
    pub fn run_info(&self) -> &RunInfo {
        &self.run
    }

    /// The scheduler.
    pub fn schedule(&self) -> &ReuseSchedule {
        &self.schedule
    }

    /// Current lifecycle state of the run.
    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Metrics collected so far.
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Validate the task tree without initializing anything.
    pub fn validate(&self) -> Result<TreePlan, ConfigError> {
        Ok(validate_tree(&self.root, self.config.reuse.enabled)?)
    }

    /// Validate the tree, then initialize every task in pre-order.
    ///
    /// On an init failure the run is marked aborted; `finish()` still
    /// finishes the tasks that were initialized.
    ///
    /// # Errors
    ///
    /// [`RunError::Config`] (nothing initialized), [`RunError::Init`], or
    /// [`RunError::Lifecycle`] if called twice.
    pub fn init(&mut self) -> Result<TreePlan, RunError> {
        let next = self.state.enter(Phase::Init)?;
        let start = Instant::now();

        let plan = self.validate()?;
        info!(
            tasks = plan.len(),
            leaves = plan.leaves().count(),
            upstream = plan.upstream_count(),
            "task tree validated"
        );

        self.state = next;
        let result = self.root.init(&InitContext::new(&self.run));
        self.metrics.init_us = start.elapsed().as_micros() as u64;

        match result {
            Ok(()) => {
                info!(
                    events = self.run.total_events,
                    reuse_period = self.run.reuse_period,
                    seed = self.run.seed,
                    "initialization complete"
                );
                Ok(plan)
            }
            Err(e) => {
                self.aborted = true;
                let failure = primary_failure(e);
                error!(task = %failure.path, error = %failure.error, "initialization failed");
                Err(RunError::Init { failure })
            }
        }
    }

    /// Execute the next event.
    ///
    /// Returns `Ok(None)` once all events have run.
    ///
    /// # Errors
    ///
    /// [`RunError::EventFailed`] aborts the run; later calls return
    /// [`RunError::Aborted`]. [`RunError::Lifecycle`] before
    /// [`init`](Self::init) or after [`finish`](Self::finish), even when
    /// no events remain.
    pub fn step(&mut self) -> Result<Option<EventMetrics>, RunError> {
        if self.aborted {
            return Err(RunError::Aborted);
        }
        let next = self.state.enter(Phase::Exec)?;
        if self.next_event >= self.run.total_events {
            return Ok(None);
        }
        self.state = next;

        let plan = self.schedule.plan(EventIndex(self.next_event));
        debug!(
            event = %plan.event,
            cycle = %plan.cycle,
            regenerate = plan.regenerate_upstream,
            "executing event"
        );

        let mut metrics = EventMetrics {
            event: plan.event.0,
            regenerated_upstream: plan.regenerate_upstream,
            ..EventMetrics::default()
        };
        let start = Instant::now();
        let ctx = ExecContext::new(&self.run, &plan);
        let result = self.root.exec_observed(&ctx, &mut |visit| {
            metrics
                .task_us
                .push((visit.name.to_string(), visit.elapsed.as_micros() as u64));
            if !visit.regenerated {
                metrics.reused_tasks += 1;
            }
        });
        metrics.total_us = start.elapsed().as_micros() as u64;

        match result {
            Ok(()) => {
                self.next_event += 1;
                self.metrics.record_event(metrics.clone());
                Ok(Some(metrics))
            }
            Err(e) => {
                self.aborted = true;
                self.metrics.exec_us += metrics.total_us;
                let failure = primary_failure(e);
                error!(
                    event = %plan.event,
                    task = %failure.path,
                    error = %failure.error,
                    "event failed; aborting run"
                );
                Err(RunError::EventFailed {
                    event: plan.event,
                    failure,
                })
            }
        }
    }

    /// Execute all remaining events.
    pub fn exec(&mut self) -> Result<(), RunError> {
        while self.step()?.is_some() {}
        Ok(())
    }

    /// Finish every initialized task in reverse order, best-effort.
    ///
    /// # Errors
    ///
    /// [`RunError::Finish`] with every failure, or [`RunError::Lifecycle`]
    /// if the run was never initialized or is already finished.
    pub fn finish(&mut self) -> Result<(), RunError> {
        self.state = self.state.enter(Phase::Finish)?;
        let start = Instant::now();
        let ctx = FinishContext::new(&self.run, self.metrics.events_executed, self.aborted);
        let result = self.root.finish(&ctx);
        self.metrics.finish_us = start.elapsed().as_micros() as u64;

        match result {
            Ok(()) => {
                info!(
                    events = self.metrics.events_executed,
                    aborted = self.aborted,
                    "run finished"
                );
                Ok(())
            }
            Err(e) => {
                let failures = e.into_failures();
                for failure in &failures {
                    warn!(task = %failure.path, error = %failure.error, "task failed to finish");
                }
                Err(RunError::Finish { failures })
            }
        }
    }

    /// Run the full lifecycle: init, every event, finish.
    ///
    /// Finish runs whenever Init was attempted, including after an
    /// aborting failure.
    ///
    /// # Errors
    ///
    /// A [`RunFailure`] with the first error and any finish failures.
    pub fn run(&mut self) -> Result<RunMetrics, RunFailure> {
        let mut primary = match self.init() {
            Ok(_) => self.exec().err(),
            Err(e @ (RunError::Config(_) | RunError::Lifecycle(_))) => {
                return Err(RunFailure {
                    error: e,
                    finish_failures: Vec::new(),
                    metrics: self.metrics.clone(),
                });
            }
            Err(e) => Some(e),
        };

        let mut finish_failures = Vec::new();
        match self.finish() {
            Ok(()) => {}
            Err(RunError::Finish { failures }) => finish_failures = failures,
            Err(other) => primary = primary.or(Some(other)),
        }

        match primary {
            None if finish_failures.is_empty() => Ok(self.metrics.clone()),
            None => Err(RunFailure {
                error: RunError::Finish {
                    failures: finish_failures,
                },
                finish_failures: Vec::new(),
                metrics: self.metrics.clone(),
            }),
            Some(error) => Err(RunFailure {
                error,
                finish_failures,
                metrics: self.metrics.clone(),
            }),
        }
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state)
            .field("next_event", &self.next_event)
            .field("total_events", &self.run.total_events)
            .field("reuse_period", &self.run.reuse_period)
            .field("aborted", &self.aborted)
            .field("tasks", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReuseConfig;
    use quench_core::{Access, Capability, EventIndex};
    use quench_task::TreeError;

    struct Leaf {
        name: &'static str,
        requires: Vec<Capability>,
        exec_calls: u64,
        fail_at: Option<u64>,
    }

    impl Leaf {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                requires: Vec::new(),
                exec_calls: 0,
                fail_at: None,
            }
        }
    }

    impl Task for Leaf {
        fn name(&self) -> &str {
            self.name
        }
        fn requires(&self) -> Vec<Capability> {
            self.requires.clone()
        }
        fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
            self.exec_calls += 1;
            if self.fail_at == Some(ctx.event().0) {
                return Err(TaskError::failed("boom"));
            }
            Ok(())
        }
    }

    fn config(events: u64) -> RunConfig {
        RunConfig {
            events,
            reuse: ReuseConfig::disabled(),
            seed: 5,
        }
    }

    #[test]
    fn new_rejects_zero_period() {
        let err = Orchestrator::new(RunConfig {
            events: 3,
            reuse: ReuseConfig::every(0),
            seed: 0,
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::InvalidReusePeriod { period: 0 });
    }

    #[test]
    fn step_runs_events_then_stops() {
        let mut o = Orchestrator::new(config(2)).unwrap();
        o.add(Leaf::new("a"));
        o.init().unwrap();
        assert_eq!(o.step().unwrap().map(|m| m.event), Some(0));
        assert_eq!(o.state(), Lifecycle::Executing);
        assert_eq!(o.step().unwrap().map(|m| m.event), Some(1));
        assert!(o.step().unwrap().is_none());
        o.finish().unwrap();
        assert_eq!(o.state(), Lifecycle::Finished);
        assert_eq!(o.metrics().events_executed, 2);
    }

    #[test]
    fn exec_before_init_is_lifecycle_error() {
        let mut o = Orchestrator::new(config(1)).unwrap();
        o.add(Leaf::new("a"));
        match o.step() {
            Err(RunError::Lifecycle(e)) => assert_eq!(e.phase, Phase::Exec),
            other => panic!("expected Lifecycle, got {other:?}"),
        }
    }

    #[test]
    fn empty_run_still_checks_lifecycle() {
        let mut o = Orchestrator::new(config(0)).unwrap();
        o.add(Leaf::new("a"));
        assert!(matches!(o.step(), Err(RunError::Lifecycle(_))));
        assert!(matches!(o.exec(), Err(RunError::Lifecycle(_))));

        o.init().unwrap();
        assert!(o.step().unwrap().is_none());
        assert_eq!(o.state(), Lifecycle::Initialized);
        o.finish().unwrap();
        assert!(matches!(o.step(), Err(RunError::Lifecycle(_))));
    }

    #[test]
    fn double_init_rejected() {
        let mut o = Orchestrator::new(config(1)).unwrap();
        o.init().unwrap();
        assert!(matches!(o.init(), Err(RunError::Lifecycle(_))));
    }

    #[test]
    fn config_error_initializes_nothing() {
        let mut o = Orchestrator::new(config(3)).unwrap();
        let mut lbt = Leaf::new("lbt");
        lbt.requires.push(Capability::new("virtuality"));
        o.add(lbt);
        let failure = o.run().unwrap_err();
        match failure.error {
            RunError::Config(ConfigError::Tree(TreeError::MissingCapability { .. })) => {}
            other => panic!("expected MissingCapability, got {other:?}"),
        }
        assert_eq!(o.state(), Lifecycle::Uninitialized);
        assert_eq!(failure.metrics.events_executed, 0);
    }

    #[test]
    fn event_failure_aborts_and_reports_event() {
        let mut o = Orchestrator::new(config(10)).unwrap();
        let mut bad = Leaf::new("bad");
        bad.fail_at = Some(3);
        o.add(Leaf::new("good"));
        o.add(bad);
        let failure = o.run().unwrap_err();
        match &failure.error {
            RunError::EventFailed { event, failure } => {
                assert_eq!(*event, EventIndex(3));
                assert_eq!(failure.path.to_string(), "bad");
            }
            other => panic!("expected EventFailed, got {other:?}"),
        }
        assert!(failure.finish_failures.is_empty());
        assert_eq!(failure.metrics.events_executed, 3);
        assert_eq!(o.state(), Lifecycle::Finished);
        assert!(matches!(o.step(), Err(RunError::Aborted)));
    }

    #[test]
    fn unowned_resource_is_config_error() {
        struct Reader;
        impl Task for Reader {
            fn name(&self) -> &str {
                "sampler"
            }
            fn resources(&self) -> Vec<quench_core::ResourceUse> {
                vec![quench_core::ResourceUse::new("medium", Access::Read)]
            }
            fn exec(&mut self, _ctx: &ExecContext<'_>) -> Result<(), TaskError> {
                Ok(())
            }
        }
        let mut o = Orchestrator::new(config(1)).unwrap();
        o.add(Reader);
        assert!(matches!(
            o.init(),
            Err(RunError::Config(ConfigError::Tree(
                TreeError::UnownedResource { .. }
            )))
        ));
    }

    #[test]
    fn run_error_display_names_task_and_event() {
        let err = RunError::EventFailed {
            event: EventIndex(3),
            failure: TaskFailure {
                path: ["eloss", "lbt"].into_iter().collect(),
                error: TaskError::failed("boom"),
            },
        };
        let text = err.to_string();
        assert!(text.contains("event 3"));
        assert!(text.contains("eloss/lbt"));
        assert_eq!(err.task().map(|p| p.to_string()), Some("eloss/lbt".into()));
    }
}
