//! Strongly-typed indices and the [`TaskPath`] type.

use smallvec::SmallVec;
use std::fmt;

/// Zero-based index of a simulated event within a run.
///
/// `EventIndex(n)` is the n-th call to the per-event Exec cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventIndex(pub u64);

impl fmt::Display for EventIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EventIndex {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Index of a reuse cycle.
///
/// A reuse cycle is a run of consecutive events sharing one upstream
/// realization. With a reuse period of `K`, event `e` belongs to cycle
/// `e / K`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleIndex(pub u64);

impl fmt::Display for CycleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CycleIndex {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Path from the root of a task tree down to one task.
///
/// Rendered as slash-separated task names, e.g.
/// `energy_loss_manager/jet_energy_loss/lbt`. The empty path denotes
/// the root itself.
///
/// Uses `SmallVec<[String; 4]>` since real trees rarely nest deeper
/// than manager → group → module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TaskPath(SmallVec<[String; 4]>);

impl TaskPath {
    /// The empty path (the tree root).
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// A single-segment path.
    pub fn from_segment(name: impl Into<String>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(name.into());
        Self(segments)
    }

    /// Return a new path one level deeper.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.0.push(name.into());
        next
    }

    /// Insert a segment at the top of the path.
    ///
    /// Used when an error bubbles up through a composite: each level
    /// prepends its own child's name.
    pub fn prepend(&mut self, name: impl Into<String>) {
        self.0.insert(0, name.into());
    }

    /// Iterate over the path segments from root to leaf.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Name of the deepest task on the path, if any.
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the empty (root) path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the enclosing composite. The root is its own parent.
    pub fn parent(&self) -> Self {
        let mut parent = self.clone();
        parent.0.pop();
        parent
    }

    /// Whether `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &TaskPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for TaskPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_displays_placeholder() {
        assert_eq!(TaskPath::root().to_string(), "<root>");
        assert!(TaskPath::root().is_root());
    }

    #[test]
    fn nested_path_joins_with_slash() {
        let path = TaskPath::from_segment("energy_loss_manager")
            .child("jet_energy_loss")
            .child("lbt");
        assert_eq!(path.to_string(), "energy_loss_manager/jet_energy_loss/lbt");
        assert_eq!(path.leaf(), Some("lbt"));
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn prepend_builds_path_bottom_up() {
        let mut path = TaskPath::from_segment("lbt");
        path.prepend("jet_energy_loss");
        path.prepend("energy_loss_manager");
        let expected: TaskPath = ["energy_loss_manager", "jet_energy_loss", "lbt"]
            .into_iter()
            .collect();
        assert_eq!(path, expected);
    }

    #[test]
    fn parent_and_prefix() {
        let lbt: TaskPath = ["eloss_manager", "eloss", "lbt"].into_iter().collect();
        let eloss = lbt.parent();
        assert_eq!(eloss.to_string(), "eloss_manager/eloss");
        assert!(lbt.starts_with(&eloss));
        assert!(lbt.starts_with(&TaskPath::root()));
        assert!(!eloss.starts_with(&lbt));
        assert!(!TaskPath::from_segment("eloss").starts_with(&eloss));
        assert_eq!(TaskPath::root().parent(), TaskPath::root());
    }

    #[test]
    fn indices_display_as_numbers() {
        assert_eq!(EventIndex(7).to_string(), "7");
        assert_eq!(CycleIndex::from(2).to_string(), "2");
    }
}
