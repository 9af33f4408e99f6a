//! MCTS tree node representation.
//!
//! The tree alternates two kinds of nodes. A Max node holds a state in which
//! self chooses a move; its children are Min nodes, one per legal self move.
//! A Min node holds the same state plus the committed self move; its children
//! are Max nodes, one per distinct state the other agents' replies lead to.
//!
//! Nodes are reference counted so several workers can walk one tree. The
//! parent link is a non-owning [`Weak`] used only by backpropagation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

/// Which side decides at a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind<M> {
    /// Self chooses among its legal moves
    Max,
    /// Self has committed to `action`; the other agents choose
    Min { action: M },
}

impl<M> NodeKind<M> {
    /// Sign applied to a child's mean utility when this node picks among its
    /// children: self maximizes its own utility, the other agents minimize it.
    #[inline]
    pub fn polarity(&self) -> f64 {
        match self {
            NodeKind::Max => 1.0,
            NodeKind::Min { .. } => -1.0,
        }
    }

    pub fn action(&self) -> Option<&M> {
        match self {
            NodeKind::Max => None,
            NodeKind::Min { action } => Some(action),
        }
    }

    pub fn is_max(&self) -> bool {
        matches!(self, NodeKind::Max)
    }
}

/// Backpropagated statistics. Utility is always self's goal scale, summed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeStats {
    pub visits: u32,
    pub utility: f64,
}

impl NodeStats {
    /// Mean utility, or `None` before the first visit.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        (self.visits > 0).then(|| self.utility / self.visits as f64)
    }
}

/// A node in the MCTS tree.
#[derive(Debug)]
pub struct MctsNode<S, M> {
    kind: NodeKind<M>,
    state: S,
    terminal: bool,
    parent: Weak<MctsNode<S, M>>,
    stats: Mutex<NodeStats>,
    children: RwLock<Vec<Arc<MctsNode<S, M>>>>,
    /// Set once, under the children write lock, after the child list is built
    expanded: AtomicBool,
    /// Set while a worker holds this node's [`Permit`]
    busy: AtomicBool,
}

impl<S, M> MctsNode<S, M> {
    /// Create a new root node.
    pub fn new_root(state: S, terminal: bool) -> Self {
        Self::new_child(NodeKind::Max, state, terminal, Weak::new())
    }

    /// Create a node below `parent`.
    pub fn new_child(
        kind: NodeKind<M>,
        state: S,
        terminal: bool,
        parent: Weak<MctsNode<S, M>>,
    ) -> Self {
        Self {
            kind,
            state,
            terminal,
            parent,
            stats: Mutex::new(NodeStats::default()),
            children: RwLock::new(Vec::new()),
            expanded: AtomicBool::new(false),
            busy: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind<M> {
        &self.kind
    }

    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Self move committed at a Min node.
    #[inline]
    pub fn action(&self) -> Option<&M> {
        self.kind.action()
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn parent(&self) -> Option<Arc<MctsNode<S, M>>> {
        self.parent.upgrade()
    }

    /// Snapshot of the node's statistics.
    pub fn stats(&self) -> NodeStats {
        *self.lock_stats()
    }

    #[inline]
    pub fn visits(&self) -> u32 {
        self.stats().visits
    }

    /// Add one visit carrying `score`.
    pub fn record(&self, score: f64) {
        let mut stats = self.lock_stats();
        stats.visits += 1;
        stats.utility += score;
    }

    /// Add another node's totals to this one.
    pub fn absorb(&self, other: NodeStats) {
        let mut stats = self.lock_stats();
        stats.visits += other.visits;
        stats.utility += other.utility;
    }

    /// Snapshot of the child list.
    pub fn children(&self) -> Vec<Arc<MctsNode<S, M>>> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn child_count(&self) -> usize {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.expanded.load(Ordering::Acquire)
    }

    /// Build the child list with `build` unless it already exists.
    ///
    /// The write lock serializes expansion: a second caller waits for the
    /// first to finish and then finds the node expanded. Returns `Ok(false)`
    /// when there was nothing to do. A failed build leaves the node
    /// unexpanded.
    pub fn expand_with<E, F>(&self, build: F) -> Result<bool, E>
    where
        F: FnOnce() -> Result<Vec<Arc<MctsNode<S, M>>>, E>,
    {
        let mut children = self
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.expanded.load(Ordering::Acquire) {
            return Ok(false);
        }
        *children = build()?;
        self.expanded.store(true, Ordering::Release);
        Ok(true)
    }

    /// Append children produced by a merge and mark the node expanded.
    pub(crate) fn adopt(&self, grafted: Vec<Arc<MctsNode<S, M>>>) {
        let mut children = self
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        children.extend(grafted);
        if !children.is_empty() {
            self.expanded.store(true, Ordering::Release);
        }
    }

    /// Try to take this node's exploration permit without blocking.
    pub fn try_permit(self: &Arc<Self>) -> Option<Permit<S, M>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Permit {
                node: Arc::clone(self),
            })
    }

    /// UCB1 value of this node seen from a parent with `parent_visits` visits
    /// and the given `polarity`. Unvisited nodes score infinity.
    #[inline]
    pub fn ucb(&self, parent_visits: u32, polarity: f64, exploration: f64) -> f64 {
        let stats = self.stats();
        match stats.mean() {
            None => f64::INFINITY,
            Some(mean) => {
                let bonus = (exploration * (parent_visits.max(1) as f64).ln()
                    / stats.visits as f64)
                    .sqrt();
                polarity * mean + bonus
            }
        }
    }

    fn lock_stats(&self) -> MutexGuard<'_, NodeStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive right to work below one node, released on drop.
#[derive(Debug)]
pub struct Permit<S, M> {
    node: Arc<MctsNode<S, M>>,
}

impl<S, M> Permit<S, M> {
    pub fn node(&self) -> &Arc<MctsNode<S, M>> {
        &self.node
    }
}

impl<S, M> Drop for Permit<S, M> {
    fn drop(&mut self) {
        self.node.busy.store(false, Ordering::Release);
    }
}

impl<S: Clone, M: Clone> MctsNode<S, M> {
    /// Copy of this node's kind, state and statistics under a new parent,
    /// without children.
    pub(crate) fn detached_copy(&self, parent: Weak<MctsNode<S, M>>) -> Self {
        let copy = Self::new_child(self.kind.clone(), self.state.clone(), self.terminal, parent);
        *copy.lock_stats() = self.stats();
        if self.is_expanded() {
            copy.expanded.store(true, Ordering::Release);
        }
        copy
    }
}

impl<S: PartialEq, M: PartialEq> MctsNode<S, M> {
    /// Whether two sibling nodes stand for the same outcome: Min children are
    /// keyed by self move, Max children by resulting state.
    pub fn same_outcome(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (NodeKind::Min { action: a }, NodeKind::Min { action: b }) => a == b,
            (NodeKind::Max, NodeKind::Max) => self.state == other.state,
            _ => false,
        }
    }
}
