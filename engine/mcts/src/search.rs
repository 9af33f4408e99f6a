//! MCTS search implementation.
//!
//! One iteration runs four phases:
//! 1. Selection: from the root, take the first unvisited child, else the
//!    first unvisited grandchild, else descend by UCB1 and repeat
//! 2. Expansion: give a selected Max node one Min child per legal self move,
//!    each immediately expanded into its distinct outcome states
//! 3. Simulation: average several random playouts from the selected node
//! 4. Backpropagation: add the average to every node up to the root
//!
//! A visited terminal node is simulated again with its goal value. Only a
//! contended permit, or a visited node that has no children yet, makes an
//! iteration give up and retry from the root.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use engine_core::{CancelToken, DefinitionError, SearchError, TransitionSystem, Watchdog};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};

use crate::node::{MctsNode, NodeKind, Permit};
use crate::tree::{MctsTree, NodeRef};

/// How an iteration protects itself against other workers on the same tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locking {
    /// The caller is the only worker on the tree
    Exclusive,
    /// Take the permit of the root child being worked below; give up the
    /// iteration if another worker holds it
    RootPermits,
}

/// Result of one call to [`MctsTree::iterate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Iteration {
    /// All four phases ran; carries the backpropagated score
    Completed(f64),
    /// Selection found no target; nothing changed
    Retry,
}

/// Running counters, updated by every worker on a tree.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    iterations: AtomicU64,
    retries: AtomicU64,
    depth_charges: AtomicU64,
    playout_moves: AtomicU64,
    select_nanos: AtomicU64,
    expand_nanos: AtomicU64,
    simulate_nanos: AtomicU64,
    backprop_nanos: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn elapsed(counter: &AtomicU64, since: Instant) -> Instant {
        let now = Instant::now();
        Self::bump(counter, (now - since).as_nanos() as u64);
        now
    }

    pub(crate) fn absorb(&self, other: &Counters) {
        let pairs = [
            (&self.iterations, &other.iterations),
            (&self.retries, &other.retries),
            (&self.depth_charges, &other.depth_charges),
            (&self.playout_moves, &other.playout_moves),
            (&self.select_nanos, &other.select_nanos),
            (&self.expand_nanos, &other.expand_nanos),
            (&self.simulate_nanos, &other.simulate_nanos),
            (&self.backprop_nanos, &other.backprop_nanos),
        ];
        for (into, from) in pairs {
            Self::bump(into, from.load(Ordering::Relaxed));
        }
    }

    fn snapshot(&self) -> SearchStats {
        SearchStats {
            iterations: self.iterations.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            depth_charges: self.depth_charges.load(Ordering::Relaxed),
            playout_moves: self.playout_moves.load(Ordering::Relaxed),
            select_nanos: self.select_nanos.load(Ordering::Relaxed),
            expand_nanos: self.expand_nanos.load(Ordering::Relaxed),
            simulate_nanos: self.simulate_nanos.load(Ordering::Relaxed),
            backprop_nanos: self.backprop_nanos.load(Ordering::Relaxed),
        }
    }
}

/// Diagnostic totals since the tree was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Iterations that ran all four phases
    pub iterations: u64,
    /// Iterations abandoned during selection
    pub retries: u64,
    /// Random playouts run
    pub depth_charges: u64,
    /// Joint moves applied across all playouts
    pub playout_moves: u64,
    pub select_nanos: u64,
    pub expand_nanos: u64,
    pub simulate_nanos: u64,
    pub backprop_nanos: u64,
}

impl SearchStats {
    /// Log a summary of the search statistics.
    pub fn log_summary(&self) {
        let per_iteration = |nanos: u64| nanos / self.iterations.max(1);
        debug!(
            iterations = self.iterations,
            retries = self.retries,
            depth_charges = self.depth_charges,
            avg_playout_moves = self.playout_moves as f64 / self.depth_charges.max(1) as f64,
            select_ns = per_iteration(self.select_nanos),
            expand_ns = per_iteration(self.expand_nanos),
            simulate_ns = per_iteration(self.simulate_nanos),
            backprop_ns = per_iteration(self.backprop_nanos),
            "MCTS search statistics"
        );
    }
}

/// Node chosen for simulation, plus the permit guarding its root child.
struct Selection<S, M> {
    target: Arc<MctsNode<S, M>>,
    _permit: Option<Permit<S, M>>,
}

impl<T: TransitionSystem> MctsTree<T> {
    /// Search until `deadline` minus the configured safety margin.
    pub fn search(&mut self, deadline: Instant) -> Result<SearchStats, SearchError> {
        let token = CancelToken::new();
        let watchdog = Watchdog::arm(deadline, self.config.safety_margin, token.clone());
        let result = self.search_until(&token);
        watchdog.disarm();
        result
    }

    /// Iterate until `token` is cancelled.
    ///
    /// The token is checked before every iteration; an iteration in flight
    /// always completes.
    pub fn search_until(&mut self, token: &CancelToken) -> Result<SearchStats, SearchError> {
        if self.root.is_terminal() {
            return Ok(self.search_stats());
        }

        let started = Instant::now();
        let before = self.search_stats();
        let mut rng = self.rng.clone();
        while !token.is_cancelled() {
            self.iterate(&mut rng, Locking::Exclusive)?;
        }
        self.rng = rng;

        let after = self.search_stats();
        debug!(
            iterations = after.iterations - before.iterations,
            retries = after.retries - before.retries,
            root_visits = self.root.visits(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "MCTS search complete"
        );
        Ok(after)
    }

    /// Run exactly `count` iterations, retries included.
    pub fn run_iterations(&mut self, count: u64) -> Result<SearchStats, SearchError> {
        let mut rng = self.rng.clone();
        for _ in 0..count {
            self.iterate(&mut rng, Locking::Exclusive)?;
        }
        self.rng = rng;
        Ok(self.search_stats())
    }

    /// Diagnostic totals accumulated by every search on this tree.
    pub fn search_stats(&self) -> SearchStats {
        self.counters.snapshot()
    }

    /// Run one select / expand / simulate / backpropagate cycle.
    pub fn iterate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        locking: Locking,
    ) -> Result<Iteration, SearchError> {
        let started = Instant::now();
        let selection = self.select(locking);
        self.complete(selection, started, rng)
    }

    /// Iterate below one root child, holding its permit for the whole
    /// iteration. Lets tests hand each worker its own first move.
    #[cfg(test)]
    pub(crate) fn iterate_below<R: Rng + ?Sized>(
        &self,
        child: &NodeRef<T>,
        rng: &mut R,
    ) -> Result<Iteration, SearchError> {
        let started = Instant::now();
        let selection = child
            .try_permit()
            .and_then(|permit| self.descend(Arc::clone(child), Some(permit), false));
        self.complete(selection, started, rng)
    }

    /// Run expansion, simulation and backpropagation on `selection`.
    fn complete<R: Rng + ?Sized>(
        &self,
        selection: Option<Selection<T::State, T::Move>>,
        started: Instant,
        rng: &mut R,
    ) -> Result<Iteration, SearchError> {
        let Some(selection) = selection else {
            Counters::bump(&self.counters.retries, 1);
            return Ok(Iteration::Retry);
        };
        let selected = Counters::elapsed(&self.counters.select_nanos, started);

        let target = &selection.target;
        self.expand(target)?;
        let expanded = Counters::elapsed(&self.counters.expand_nanos, selected);

        let score = self.simulate(target, rng)?;
        let simulated = Counters::elapsed(&self.counters.simulate_nanos, expanded);

        self.backpropagate(target, score);
        Counters::elapsed(&self.counters.backprop_nanos, simulated);
        Counters::bump(&self.counters.iterations, 1);

        trace!(
            max_node = target.kind().is_max(),
            terminal = target.is_terminal(),
            score,
            "MCTS iteration"
        );
        Ok(Iteration::Completed(score))
    }

    /// Find the node to simulate, or `None` when the iteration must be
    /// retried.
    fn select(&self, locking: Locking) -> Option<Selection<T::State, T::Move>> {
        let root = &self.root;
        let shared = locking == Locking::RootPermits;

        if root.visits() == 0 {
            let permit = if shared {
                let permit = root.try_permit()?;
                // Another worker may have finished the first visit meanwhile
                if root.visits() != 0 {
                    return None;
                }
                Some(permit)
            } else {
                None
            };
            return Some(Selection {
                target: Arc::clone(root),
                _permit: permit,
            });
        }

        self.descend(Arc::clone(root), None, shared)
    }

    /// Walk down from `start` to the node to simulate. `permit` guards the
    /// root child the walk is under, if one is already held.
    fn descend(
        &self,
        start: NodeRef<T>,
        mut permit: Option<Permit<T::State, T::Move>>,
        shared: bool,
    ) -> Option<Selection<T::State, T::Move>> {
        let root = &self.root;
        let mut current = start;
        loop {
            // Terminal nodes are re-simulated with their goal value
            if current.visits() == 0 || current.is_terminal() {
                return Some(Selection {
                    target: current,
                    _permit: permit,
                });
            }
            let children = current.children();
            if children.is_empty() {
                return None;
            }

            let at_root = Arc::ptr_eq(&current, root);
            let step = self.step(&current, &children);

            if shared && at_root {
                let guard = step.via().try_permit()?;
                // Re-check under the permit: the candidate may have been
                // simulated by the previous holder
                if let Step::Target { node, .. } = &step {
                    if node.visits() != 0 {
                        return None;
                    }
                }
                permit = Some(guard);
            }

            match step {
                Step::Target { node, .. } => {
                    return Some(Selection {
                        target: node,
                        _permit: permit,
                    })
                }
                Step::Descend(child) => current = child,
            }
        }
    }

    /// Selection rule at a visited, non-terminal node with children.
    fn step(
        &self,
        node: &NodeRef<T>,
        children: &[NodeRef<T>],
    ) -> Step<T::State, T::Move> {
        if let Some(child) = children.iter().find(|c| c.visits() == 0) {
            return Step::Target {
                via: Arc::clone(child),
                node: Arc::clone(child),
            };
        }

        for child in children {
            if let Some(grandchild) = child.children().into_iter().find(|g| g.visits() == 0) {
                return Step::Target {
                    via: Arc::clone(child),
                    node: grandchild,
                };
            }
        }

        let parent_visits = node.visits();
        let polarity = node.kind().polarity();
        let mut best = &children[0];
        let mut best_score = f64::NEG_INFINITY;
        for child in children {
            let score = child.ucb(parent_visits, polarity, self.config.exploration);
            if score > best_score {
                best = child;
                best_score = score;
            }
        }
        Step::Descend(Arc::clone(best))
    }

    /// Expand `node` unless it is terminal or already expanded.
    fn expand(&self, node: &NodeRef<T>) -> Result<(), DefinitionError> {
        if node.is_terminal() || node.is_expanded() {
            return Ok(());
        }
        match node.kind() {
            NodeKind::Max => self.expand_max(node),
            NodeKind::Min { action } => self.expand_min(node, action),
        }
    }

    /// One Min child per legal self move, each expanded on creation.
    fn expand_max(&self, node: &NodeRef<T>) -> Result<(), DefinitionError> {
        node.expand_with(|| {
            let moves = self.system.legal_moves(node.state(), &self.agent)?;
            if moves.is_empty() {
                return Err(DefinitionError::NoLegalMoves {
                    state: format!("{:?}", node.state()),
                    agent: format!("{:?}", self.agent),
                });
            }

            let mut children = Vec::with_capacity(moves.len());
            for action in moves {
                let child = Arc::new(MctsNode::new_child(
                    NodeKind::Min {
                        action: action.clone(),
                    },
                    node.state().clone(),
                    false,
                    Arc::downgrade(node),
                ));
                self.expand_min(&child, &action)?;
                children.push(child);
            }
            Ok(children)
        })?;
        Ok(())
    }

    /// One Max child per distinct state reachable by the joint moves that
    /// contain `action`, in the order the transition system lists them.
    fn expand_min(&self, node: &NodeRef<T>, action: &T::Move) -> Result<(), DefinitionError> {
        node.expand_with(|| {
            let joints = self
                .system
                .legal_joint_moves(node.state(), &self.agent, action)?;

            let mut seen = HashSet::with_capacity(joints.len());
            let mut children = Vec::new();
            for joint in &joints {
                let next = self.system.next_state(node.state(), joint)?;
                if seen.insert(next.clone()) {
                    let terminal = self.system.is_terminal(&next);
                    children.push(Arc::new(MctsNode::new_child(
                        NodeKind::Max,
                        next,
                        terminal,
                        Arc::downgrade(node),
                    )));
                }
            }

            if children.is_empty() {
                return Err(DefinitionError::NoJointMoves {
                    state: format!("{:?}", node.state()),
                    action: format!("{action:?}"),
                });
            }
            Ok(children)
        })?;
        Ok(())
    }

    /// Average goal over `depth_charges` random playouts from `node`.
    ///
    /// A Min node has already fixed self's move, so each playout first
    /// applies a random joint move containing that move.
    fn simulate<R: Rng + ?Sized>(&self, node: &NodeRef<T>, rng: &mut R) -> Result<f64, SearchError> {
        if node.is_terminal() {
            return Ok(self.system.goal(node.state(), &self.agent)? as f64);
        }

        let committed = match node.kind() {
            NodeKind::Max => None,
            NodeKind::Min { action } => Some((
                action,
                self.system
                    .legal_joint_moves(node.state(), &self.agent, action)?,
            )),
        };

        let charges = self.config.depth_charges.max(1);
        let mut total = 0.0;
        for _ in 0..charges {
            let charge = match &committed {
                None => self.system.depth_charge(node.state(), &self.agent, rng)?,
                Some((action, joints)) => {
                    let joint = joints.choose(rng).ok_or_else(|| DefinitionError::NoJointMoves {
                        state: format!("{:?}", node.state()),
                        action: format!("{action:?}"),
                    })?;
                    let next = self.system.next_state(node.state(), joint)?;
                    let mut charge = self.system.depth_charge(&next, &self.agent, rng)?;
                    charge.depth += 1;
                    charge
                }
            };
            total += charge.goal as f64;
            Counters::bump(&self.counters.playout_moves, charge.depth as u64);
        }
        Counters::bump(&self.counters.depth_charges, charges as u64);

        Ok(total / charges as f64)
    }

    /// Add `score` to every node from `node` up to the current root.
    fn backpropagate(&self, node: &NodeRef<T>, score: f64) {
        let mut current = Some(Arc::clone(node));
        while let Some(node) = current {
            node.record(score);
            if Arc::ptr_eq(&node, &self.root) {
                break;
            }
            current = node.parent();
        }
    }
}

/// Decision taken at one node during selection.
enum Step<S, M> {
    /// Simulate `node`, reached through the child `via`
    Target {
        via: Arc<MctsNode<S, M>>,
        node: Arc<MctsNode<S, M>>,
    },
    /// Continue selection at this child
    Descend(Arc<MctsNode<S, M>>),
}

impl<S, M> Step<S, M> {
    /// Child of the current node this step works below.
    fn via(&self) -> &Arc<MctsNode<S, M>> {
        match self {
            Step::Target { via, .. } => via,
            Step::Descend(child) => child,
        }
    }
}
