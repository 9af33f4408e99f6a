//! MCTS tree ownership, root management and move choice.
//!
//! The tree owns its root Max node and, through it, the whole node graph.
//! Between turns the root is re-pointed at the grandchild matching the real
//! game state, which keeps that subtree's statistics and drops the rest.

use std::sync::Arc;

use engine_core::{SearchError, TransitionSystem};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, warn};

use crate::config::MctsConfig;
use crate::node::MctsNode;
use crate::search::Counters;

/// Shared handle to a node of a tree over `T`.
pub type NodeRef<T> =
    Arc<MctsNode<<T as TransitionSystem>::State, <T as TransitionSystem>::Move>>;

/// Outcome of [`MctsTree::update_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootUpdate {
    /// The root already holds the state
    Unchanged,
    /// A grandchild holding the state became the root, statistics intact
    Reused,
    /// The state was not in the tree; a fresh root was created
    Rebuilt,
}

/// MCTS search tree for one agent.
pub struct MctsTree<T: TransitionSystem> {
    pub(crate) system: Arc<T>,
    pub(crate) agent: T::Agent,
    pub(crate) root: NodeRef<T>,
    pub(crate) config: MctsConfig,
    pub(crate) rng: ChaCha20Rng,
    pub(crate) counters: Counters,
}

impl<T: TransitionSystem> MctsTree<T> {
    /// Create a tree searching on behalf of `agent`, rooted at `root_state`.
    pub fn new(system: Arc<T>, agent: T::Agent, root_state: T::State, config: MctsConfig) -> Self {
        let root = Self::fresh_root(&system, root_state);
        let rng = ChaCha20Rng::seed_from_u64(config.seed);
        Self {
            system,
            agent,
            root,
            config,
            rng,
            counters: Counters::default(),
        }
    }

    fn fresh_root(system: &T, state: T::State) -> NodeRef<T> {
        let terminal = system.is_terminal(&state);
        Arc::new(MctsNode::new_root(state, terminal))
    }

    /// Get the root node.
    #[inline]
    pub fn root(&self) -> &NodeRef<T> {
        &self.root
    }

    pub fn agent(&self) -> &T::Agent {
        &self.agent
    }

    pub fn system(&self) -> &Arc<T> {
        &self.system
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Discard the tree and start over at `state`.
    pub fn set_root(&mut self, state: T::State) {
        self.root = Self::fresh_root(&self.system, state);
    }

    /// Advance the root to the real game state.
    ///
    /// Looks two levels down (self move, then the other agents' reply) for a
    /// node holding `state` and re-roots there. Anything else rebuilds.
    pub fn update_root(&mut self, state: &T::State) -> RootUpdate {
        if self.root.state() == state {
            return RootUpdate::Unchanged;
        }

        let found = self
            .root
            .children()
            .iter()
            .flat_map(|min| min.children())
            .find(|max| max.state() == state);

        match found {
            Some(node) => {
                let stats = node.stats();
                debug!(
                    visits = stats.visits,
                    utility = stats.utility,
                    "Reusing subtree for new root"
                );
                self.root = node;
                RootUpdate::Reused
            }
            None => {
                debug!(state = ?state, "New root not in tree, rebuilding");
                self.set_root(state.clone());
                RootUpdate::Rebuilt
            }
        }
    }

    /// Self move with the best mean outcome among the root's visited children.
    ///
    /// Ties keep the first child. Without any visited child the first child's
    /// move is returned, and without children the first legal move.
    pub fn choose_move(&self) -> Result<T::Move, SearchError> {
        let children = self.root.children();

        let mut best: Option<(f64, &NodeRef<T>)> = None;
        for child in &children {
            if let Some(mean) = child.stats().mean() {
                if best.map_or(true, |(top, _)| mean > top) {
                    best = Some((mean, child));
                }
            }
        }

        if let Some(action) = best.and_then(|(_, child)| child.action()) {
            return Ok(action.clone());
        }

        if let Some(action) = children.first().and_then(|child| child.action()) {
            warn!("No root child visited, falling back to first child");
            return Ok(action.clone());
        }

        if self.root.is_terminal() {
            return Err(SearchError::TerminalRoot);
        }
        self.system
            .legal_moves(self.root.state(), &self.agent)?
            .into_iter()
            .next()
            .ok_or(SearchError::NoLegalMoves)
    }

    /// Add `other`'s statistics into this tree.
    ///
    /// Nodes are matched by self move below Max nodes and by resulting state
    /// below Min nodes; matching nodes sum their visits and utility, and
    /// subtrees only `other` has are copied in. Returns `false` without
    /// changing anything when the roots hold different states.
    pub fn merge(&self, other: &MctsTree<T>) -> bool {
        if self.root.state() != other.root.state() {
            warn!("Cannot merge trees rooted at different states");
            return false;
        }

        let mut pending = vec![(Arc::clone(&self.root), Arc::clone(&other.root))];
        while let Some((into, from)) = pending.pop() {
            into.absorb(from.stats());

            let existing = into.children();
            let mut grafted = Vec::new();
            for theirs in from.children() {
                match existing.iter().find(|ours| ours.same_outcome(&theirs)) {
                    Some(ours) => pending.push((Arc::clone(ours), theirs)),
                    None => grafted.push(graft(&theirs, &into)),
                }
            }
            if !grafted.is_empty() {
                into.adopt(grafted);
            }
        }

        self.counters.absorb(&other.counters);
        true
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.root.stats();
        let mut total_nodes = 0;
        let mut max_depth = 0;
        let mut pending = vec![(Arc::clone(&self.root), 0u32)];
        while let Some((node, depth)) = pending.pop() {
            total_nodes += 1;
            max_depth = max_depth.max(depth);
            pending.extend(node.children().into_iter().map(|c| (c, depth + 1)));
        }

        TreeStats {
            total_nodes,
            root_visits: root.visits,
            root_value: root.mean(),
            max_depth,
        }
    }
}

/// Deep copy of `node` and its subtree, hanging below `parent`.
fn graft<S: Clone, M: Clone>(
    node: &Arc<MctsNode<S, M>>,
    parent: &Arc<MctsNode<S, M>>,
) -> Arc<MctsNode<S, M>> {
    let top = Arc::new(node.detached_copy(Arc::downgrade(parent)));
    let mut pending = vec![(Arc::clone(node), Arc::clone(&top))];
    while let Some((from, to)) = pending.pop() {
        let copies: Vec<_> = from
            .children()
            .into_iter()
            .map(|child| {
                let copy = Arc::new(child.detached_copy(Arc::downgrade(&to)));
                pending.push((child, Arc::clone(&copy)));
                copy
            })
            .collect();
        to.adopt(copies);
    }
    top
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    /// Mean utility at the root, `None` before the first visit
    pub root_value: Option<f64>,
    /// Edges on the longest root-to-leaf path
    pub max_depth: u32,
}
