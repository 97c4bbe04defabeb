//! Tree validation and the flattened [`TreePlan`].
//!
//! [`validate_tree`] runs once, before Init, and turns the declarations
//! every task makes (`kind`, `provides`, `requires`, `resources`) into
//! checked preconditions. Nothing is inferred or reordered: the caller's
//! insertion order is the execution order, and validation only rejects
//! orders that would break a declared constraint.

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;
use quench_core::{Access, Capability, ResourceKey, TaskKind, TaskPath};
use smallvec::SmallVec;

use crate::task::Task;

// ── Plan ───────────────────────────────────────────────────────────

/// One task of the tree, in pre-order position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedTask {
    /// Path from the root.
    pub path: TaskPath,
    /// Declared scheduling class.
    pub kind: TaskKind,
    /// Whether the task has children.
    pub composite: bool,
}

/// The validated tree, flattened in pre-order (the order in which
/// `init` and `exec` reach each task).
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct TreePlan {
    tasks: Vec<PlannedTask>,
}

impl TreePlan {
    /// Number of tasks (composites included, root excluded).
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the tree has no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &PlannedTask> {
        self.tasks.iter()
    }

    /// Leaf tasks in pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = &PlannedTask> {
        self.tasks.iter().filter(|t| !t.composite)
    }

    /// Number of upstream (reuse-eligible) leaves.
    pub fn upstream_count(&self) -> usize {
        self.leaves().filter(|t| t.kind.is_reusable()).count()
    }
}

// ── Errors ─────────────────────────────────────────────────────────

/// Structural errors detected by [`validate_tree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// Two children of the same composite share a name.
    DuplicateSibling {
        /// Path of the second child with the name.
        path: TaskPath,
    },
    /// A required capability is not provided anywhere in the tree.
    MissingCapability {
        /// The requiring task.
        task: TaskPath,
        /// The capability.
        capability: Capability,
    },
    /// A required capability is only provided by a later task.
    CapabilityOrder {
        /// The requiring task.
        task: TaskPath,
        /// The capability.
        capability: Capability,
        /// The provider, which must be moved before `task`.
        provider: TaskPath,
    },
    /// A resource is used but no task in the tree owns it.
    UnownedResource {
        /// The resource.
        key: ResourceKey,
        /// First task using it.
        user: TaskPath,
    },
    /// More than one task declares ownership of a resource.
    MultipleOwners {
        /// The resource.
        key: ResourceKey,
        /// First owner in execution order.
        first: TaskPath,
        /// Second owner in execution order.
        second: TaskPath,
    },
    /// A reader runs before the owner publishes.
    ReadBeforePublish {
        /// The resource.
        key: ResourceKey,
        /// The early reader.
        reader: TaskPath,
        /// The owner.
        owner: TaskPath,
    },
    /// An accumulator runs after the owner has consumed the accumulation.
    AccumulateAfterOwner {
        /// The resource.
        key: ResourceKey,
        /// The late accumulator.
        accumulator: TaskPath,
        /// The owner.
        owner: TaskPath,
    },
    /// With reuse enabled, an upstream task depends on a resource that
    /// is regenerated every event, so reusing its output would be stale.
    ReuseDependsOnEventState {
        /// The resource.
        key: ResourceKey,
        /// The upstream consumer.
        task: TaskPath,
        /// The non-upstream owner.
        owner: TaskPath,
    },
    /// A non-sink task is placed after a sink.
    SinkNotLast {
        /// The sink.
        sink: TaskPath,
        /// The task that follows it.
        follower: TaskPath,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSibling { path } => {
                write!(f, "duplicate task name at '{path}'")
            }
            Self::MissingCapability { task, capability } => write!(
                f,
                "task '{task}' requires '{capability}', which no task provides"
            ),
            Self::CapabilityOrder {
                task,
                capability,
                provider,
            } => write!(
                f,
                "task '{task}' requires '{capability}', but its provider '{provider}' \
                 runs after it"
            ),
            Self::UnownedResource { key, user } => write!(
                f,
                "resource '{key}' used by '{user}' has no owner in the task tree"
            ),
            Self::MultipleOwners { key, first, second } => write!(
                f,
                "resource '{key}' is owned by both '{first}' and '{second}'"
            ),
            Self::ReadBeforePublish { key, reader, owner } => write!(
                f,
                "'{reader}' reads resource '{key}' before its owner '{owner}' runs"
            ),
            Self::AccumulateAfterOwner {
                key,
                accumulator,
                owner,
            } => write!(
                f,
                "'{accumulator}' accumulates into resource '{key}' after its owner \
                 '{owner}' runs"
            ),
            Self::ReuseDependsOnEventState { key, task, owner } => write!(
                f,
                "upstream task '{task}' depends on resource '{key}', which '{owner}' \
                 regenerates every event"
            ),
            Self::SinkNotLast { sink, follower } => {
                write!(f, "task '{follower}' runs after sink '{sink}'")
            }
        }
    }
}

impl Error for TreeError {}

// ── Validation ─────────────────────────────────────────────────────

struct Node<'t> {
    task: &'t dyn Task,
    path: TaskPath,
}

fn flatten<'t>(task: &'t dyn Task, path: &TaskPath, out: &mut Vec<Node<'t>>) -> Result<(), TreeError> {
    let children = task.subtasks();
    let mut seen: SmallVec<[&str; 8]> = SmallVec::new();
    for child in children {
        let child_path = path.child(child.name());
        if seen.contains(&child.name()) {
            return Err(TreeError::DuplicateSibling { path: child_path });
        }
        seen.push(child.name());
        out.push(Node {
            task: child,
            path: child_path.clone(),
        });
        flatten(child, &child_path, out)?;
    }
    Ok(())
}

/// Validate the tree below `root` and return its [`TreePlan`].
///
/// `root` itself is not part of any path; its children are the
/// top-level tasks. Checks performed, in order:
///
/// 1. Sibling names are unique, so every path is unambiguous.
/// 2. Every required capability is provided by a task earlier in
///    pre-order and inside the requirer's enclosing composite: an
///    earlier sibling or a task below one.
/// 3. Every used resource has exactly one owner; readers come after it
///    and accumulators before it.
/// 4. With `reuse_enabled`, no upstream task reads or accumulates into
///    a resource owned by a non-upstream task.
/// 5. No non-sink leaf follows a sink leaf.
pub fn validate_tree(root: &dyn Task, reuse_enabled: bool) -> Result<TreePlan, TreeError> {
    let mut nodes = Vec::new();
    flatten(root, &TaskPath::root(), &mut nodes)?;

    check_capabilities(&nodes)?;
    check_resources(&nodes, reuse_enabled)?;
    check_sinks(&nodes)?;

    Ok(TreePlan {
        tasks: nodes
            .into_iter()
            .map(|n| PlannedTask {
                composite: !n.task.subtasks().is_empty(),
                kind: n.task.kind(),
                path: n.path,
            })
            .collect(),
    })
}

fn check_capabilities(nodes: &[Node<'_>]) -> Result<(), TreeError> {
    for (i, node) in nodes.iter().enumerate() {
        let scope = node.path.parent();
        for capability in node.task.requires() {
            // Providers only count inside the requirer's enclosing composite.
            let mut in_scope = nodes
                .iter()
                .enumerate()
                .filter(|(j, n)| {
                    *j != i && n.path.starts_with(&scope) && !n.path.starts_with(&node.path)
                })
                .filter(|(_, n)| n.task.provides().contains(&capability))
                .map(|(j, _)| j);
            match in_scope.next() {
                Some(p) if p < i => {}
                Some(p) => {
                    return Err(TreeError::CapabilityOrder {
                        task: node.path.clone(),
                        capability,
                        provider: nodes[p].path.clone(),
                    })
                }
                None => {
                    return Err(TreeError::MissingCapability {
                        task: node.path.clone(),
                        capability,
                    })
                }
            }
        }
    }
    Ok(())
}

fn check_resources(nodes: &[Node<'_>], reuse_enabled: bool) -> Result<(), TreeError> {
    // key → [(node index, access)] in pre-order.
    let mut uses: IndexMap<ResourceKey, Vec<(usize, Access)>> = IndexMap::new();
    for (i, node) in nodes.iter().enumerate() {
        for u in node.task.resources() {
            uses.entry(u.key).or_default().push((i, u.access));
        }
    }

    for (key, users) in &uses {
        let mut owners = users.iter().filter(|(_, a)| *a == Access::Own);
        let owner = match owners.next() {
            Some(&(o, _)) => o,
            None => {
                return Err(TreeError::UnownedResource {
                    key: key.clone(),
                    user: nodes[users[0].0].path.clone(),
                })
            }
        };
        if let Some(&(second, _)) = owners.next() {
            return Err(TreeError::MultipleOwners {
                key: key.clone(),
                first: nodes[owner].path.clone(),
                second: nodes[second].path.clone(),
            });
        }

        for &(user, access) in users {
            match access {
                Access::Own => {}
                Access::Read if user < owner => {
                    return Err(TreeError::ReadBeforePublish {
                        key: key.clone(),
                        reader: nodes[user].path.clone(),
                        owner: nodes[owner].path.clone(),
                    })
                }
                Access::Accumulate if user > owner => {
                    return Err(TreeError::AccumulateAfterOwner {
                        key: key.clone(),
                        accumulator: nodes[user].path.clone(),
                        owner: nodes[owner].path.clone(),
                    })
                }
                Access::Read | Access::Accumulate => {}
            }

            if reuse_enabled
                && access != Access::Own
                && nodes[user].task.kind().is_reusable()
                && !nodes[owner].task.kind().is_reusable()
            {
                return Err(TreeError::ReuseDependsOnEventState {
                    key: key.clone(),
                    task: nodes[user].path.clone(),
                    owner: nodes[owner].path.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_sinks(nodes: &[Node<'_>]) -> Result<(), TreeError> {
    let mut sink: Option<&TaskPath> = None;
    for node in nodes.iter().filter(|n| n.task.subtasks().is_empty()) {
        match (node.task.kind(), sink) {
            (TaskKind::Sink, None) => sink = Some(&node.path),
            (TaskKind::Sink, Some(_)) => {}
            (_, Some(s)) => {
                return Err(TreeError::SinkNotLast {
                    sink: s.clone(),
                    follower: node.path.clone(),
                })
            }
            (_, None) => {}
        }
    }
    Ok(())
}
