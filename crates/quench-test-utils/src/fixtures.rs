//! Reusable task fixtures.
//!
//! - [`CallLog`]: a cloneable, thread-safe journal of lifecycle calls.
//! - [`RecordingTask`]: a leaf with configurable declarations that
//!   records every call into a [`CallLog`] and can fail on demand.

use std::sync::{Arc, Mutex, MutexGuard};

use quench_core::{Access, Capability, ResourceUse, TaskError, TaskKind};
use quench_task::{ExecContext, FinishContext, InitContext, Task};

/// Lifecycle operation recorded in a [`CallLog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Init,
    Exec,
    Reuse,
    Finish,
}

/// One recorded call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub task: String,
    pub op: Op,
    /// Event index for `Exec` and `Reuse`.
    pub event: Option<u64>,
    /// Seed handed to the task for `Exec` and `Reuse`.
    pub seed: Option<u64>,
}

/// Shared, ordered journal of lifecycle calls.
///
/// Clones share the same journal, so one log can be handed to every
/// fixture in a tree and inspected after the run.
#[derive(Clone, Debug, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, call: Call) {
        self.lock().push(call);
    }

    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// `(task, op)` pairs in call order.
    pub fn ops(&self) -> Vec<(String, Op)> {
        self.lock()
            .iter()
            .map(|c| (c.task.clone(), c.op))
            .collect()
    }

    /// Names of the tasks that received `op`, in call order.
    pub fn tasks_for(&self, op: Op) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|c| c.op == op)
            .map(|c| c.task.clone())
            .collect()
    }

    /// Number of `op` calls received by `task`.
    pub fn count(&self, task: &str, op: Op) -> usize {
        self.lock()
            .iter()
            .filter(|c| c.task == task && c.op == op)
            .count()
    }

    /// Event indices at which `task` received `op`.
    pub fn events(&self, task: &str, op: Op) -> Vec<u64> {
        self.lock()
            .iter()
            .filter(|c| c.task == task && c.op == op)
            .filter_map(|c| c.event)
            .collect()
    }

    /// Seeds handed to `task` on its `Exec` calls.
    pub fn exec_seeds(&self, task: &str) -> Vec<u64> {
        self.lock()
            .iter()
            .filter(|c| c.task == task && c.op == Op::Exec)
            .filter_map(|c| c.seed)
            .collect()
    }

    /// Position of the first `op` call for `task`.
    pub fn position(&self, task: &str, op: Op) -> Option<usize> {
        self.lock()
            .iter()
            .position(|c| c.task == task && c.op == op)
    }
}

/// Where a [`RecordingTask`] should fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailAt {
    Init,
    /// Fail `exec()` on the given event index.
    Exec(u64),
    Finish,
}

/// A leaf task that records every lifecycle call.
///
/// Declarations are set through the builder methods; by default the
/// task is [`TaskKind::Downstream`] with no capabilities or resources.
/// The call is recorded before any configured failure is returned.
pub struct RecordingTask {
    name: String,
    kind: TaskKind,
    provides: Vec<Capability>,
    requires: Vec<Capability>,
    resources: Vec<ResourceUse>,
    fail: Option<FailAt>,
    log: CallLog,
}

impl RecordingTask {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Downstream,
            provides: Vec::new(),
            requires: Vec::new(),
            resources: Vec::new(),
            fail: None,
            log: log.clone(),
        }
    }

    /// Shorthand for an upstream task.
    pub fn upstream(name: impl Into<String>, log: &CallLog) -> Self {
        Self::new(name, log).kind(TaskKind::Upstream)
    }

    /// Shorthand for a sink.
    pub fn sink(name: impl Into<String>, log: &CallLog) -> Self {
        Self::new(name, log).kind(TaskKind::Sink)
    }

    pub fn kind(mut self, kind: TaskKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn provides(mut self, capability: Capability) -> Self {
        self.provides.push(capability);
        self
    }

    pub fn requires(mut self, capability: Capability) -> Self {
        self.requires.push(capability);
        self
    }

    pub fn uses(mut self, key: &str, access: Access) -> Self {
        self.resources.push(ResourceUse::new(key, access));
        self
    }

    pub fn fail_at(mut self, at: FailAt) -> Self {
        self.fail = Some(at);
        self
    }

    fn record(&self, op: Op, ctx: Option<&ExecContext<'_>>) {
        self.log.record(Call {
            task: self.name.clone(),
            op,
            event: ctx.map(|c| c.event().0),
            seed: ctx.map(|c| c.seed_for(self.kind)),
        });
    }

    fn deliberate(&self, what: &str) -> TaskError {
        TaskError::failed(format!("deliberate {what} failure in {}", self.name))
    }
}

impl Task for RecordingTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        self.kind
    }

    fn provides(&self) -> Vec<Capability> {
        self.provides.clone()
    }

    fn requires(&self) -> Vec<Capability> {
        self.requires.clone()
    }

    fn resources(&self) -> Vec<ResourceUse> {
        self.resources.clone()
    }

    fn init(&mut self, _ctx: &InitContext<'_>) -> Result<(), TaskError> {
        self.record(Op::Init, None);
        match self.fail {
            Some(FailAt::Init) => Err(self.deliberate("init")),
            _ => Ok(()),
        }
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        self.record(Op::Exec, Some(ctx));
        match self.fail {
            Some(FailAt::Exec(event)) if event == ctx.event().0 => Err(self.deliberate("exec")),
            _ => Ok(()),
        }
    }

    fn reuse(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        self.record(Op::Reuse, Some(ctx));
        Ok(())
    }

    fn finish(&mut self, _ctx: &FinishContext<'_>) -> Result<(), TaskError> {
        self.record(Op::Finish, None);
        match self.fail {
            Some(FailAt::Finish) => Err(self.deliberate("finish")),
            _ => Ok(()),
        }
    }
}
