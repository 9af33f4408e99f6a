//! Depth- and time-bounded alpha-beta search.
//!
//! Every self turn is two plies: a max layer over self's legal moves and a min
//! layer over the joint moves the other agents can combine with the chosen
//! move. Depth counts self turns, so `max_depth = 2` looks at two of self's
//! decisions.
//!
//! With time slicing enabled, the time left at a node is divided evenly across
//! the siblings still to be searched, recomputed after each one so that
//! branches finishing early release their unused share. A branch whose share
//! runs out, or any branch once the watchdog cancels the search, is scored by
//! the leaf evaluator instead of being deepened. The root always enumerates
//! its moves, so a best-effort move exists even when time is already gone.

use std::sync::Arc;
use std::time::Instant;

use engine_core::{CancelToken, DefinitionError, Score, SearchError, TransitionSystem, Watchdog};
use tracing::{debug, trace};

use crate::config::AlphaBetaConfig;
use crate::heuristic::LeafEvaluator;
use crate::report::{SearchReport, SearchStats};

/// Alpha-beta engine for one agent.
pub struct AlphaBeta<T: TransitionSystem, H> {
    system: Arc<T>,
    agent: T::Agent,
    heuristic: H,
    config: AlphaBetaConfig,
}

impl<T, H> AlphaBeta<T, H>
where
    T: TransitionSystem,
    H: LeafEvaluator<T>,
{
    pub fn new(system: Arc<T>, agent: T::Agent, heuristic: H, config: AlphaBetaConfig) -> Self {
        Self {
            system,
            agent,
            heuristic,
            config,
        }
    }

    pub fn agent(&self) -> &T::Agent {
        &self.agent
    }

    pub fn config(&self) -> &AlphaBetaConfig {
        &self.config
    }

    /// Best move for the engine's agent, found before `deadline`.
    ///
    /// A watchdog stops the search `safety_margin` before the deadline; the
    /// move attached to the best root score found so far is returned.
    pub fn select_move(&self, state: &T::State, deadline: Instant) -> Result<T::Move, SearchError> {
        if self.system.is_terminal(state) {
            return Err(SearchError::TerminalRoot);
        }

        let moves = self.system.legal_moves(state, &self.agent)?;
        match moves.as_slice() {
            [] => return Err(SearchError::NoLegalMoves),
            [only] => {
                debug!(action = ?only, "Single legal move, skipping search");
                return Ok(only.clone());
            }
            _ => {}
        }

        let token = CancelToken::new();
        let watchdog = Watchdog::arm(deadline, self.config.safety_margin, token.clone());
        let slice_end = self
            .config
            .time_sliced
            .then(|| Watchdog::stop_at(deadline, self.config.safety_margin));

        let started = Instant::now();
        let result = self.search(state, &token, slice_end);
        watchdog.disarm();
        let report = result?;

        debug!(
            value = report.score.value,
            action = ?report.score.action,
            nodes = report.stats.nodes,
            cutoffs = report.stats.cutoffs,
            heuristic_evaluations = report.stats.heuristic_evaluations,
            stopped_early = token.is_cancelled(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Alpha-beta search complete"
        );

        report.score.action.ok_or(SearchError::NoLegalMoves)
    }

    /// Run one search from `state`.
    ///
    /// `slice_end` is the instant the time-sliced budget runs out (`None` for
    /// no slicing); `token` aborts deepening once cancelled. A terminal `state`
    /// yields its goal value with no action.
    pub fn search(
        &self,
        state: &T::State,
        token: &CancelToken,
        slice_end: Option<Instant>,
    ) -> Result<SearchReport<T::Move>, SearchError> {
        let mut walk = Walk {
            engine: self,
            token,
            stats: SearchStats::default(),
        };
        let score = walk.max_r(state, 0, i32::MIN, i32::MAX, slice_end)?;
        Ok(SearchReport {
            score,
            stats: walk.stats,
        })
    }
}

/// Recursion state for one search call.
struct Walk<'a, T: TransitionSystem, H> {
    engine: &'a AlphaBeta<T, H>,
    token: &'a CancelToken,
    stats: SearchStats,
}

impl<'a, T, H> Walk<'a, T, H>
where
    T: TransitionSystem,
    H: LeafEvaluator<T>,
{
    fn max_r(
        &mut self,
        state: &T::State,
        depth: u32,
        mut alpha: i32,
        beta: i32,
        slice_end: Option<Instant>,
    ) -> Result<Score<T::Move>, DefinitionError> {
        let engine = self.engine;
        let system = engine.system.as_ref();
        self.stats.nodes += 1;

        if system.is_terminal(state) {
            self.stats.terminal_evaluations += 1;
            return Ok(Score::leaf(system.goal(state, &engine.agent)?));
        }

        if depth > 0 && self.out_of_budget(depth, slice_end) {
            self.stats.heuristic_evaluations += 1;
            let value = engine.heuristic.evaluate(system, state, &engine.agent)?;
            trace!(depth, value, "Leaf evaluation");
            return Ok(Score::leaf(value));
        }

        let moves = system.legal_moves(state, &engine.agent)?;
        let count = moves.len();
        let mut best: Option<Score<T::Move>> = None;

        for (i, action) in moves.into_iter().enumerate() {
            let child_end = share_of(slice_end, count - i);
            let score = self.min_r(state, action, depth, alpha, beta, child_end)?;
            let current = match best {
                Some(best) => best.better_of(score),
                None => score,
            };
            alpha = alpha.max(current.value);
            best = Some(current);

            if beta <= alpha {
                if i + 1 < count {
                    self.stats.cutoffs += 1;
                }
                break;
            }
        }

        best.ok_or_else(|| DefinitionError::NoLegalMoves {
            state: format!("{state:?}"),
            agent: format!("{:?}", engine.agent),
        })
    }

    fn min_r(
        &mut self,
        state: &T::State,
        action: T::Move,
        depth: u32,
        alpha: i32,
        mut beta: i32,
        slice_end: Option<Instant>,
    ) -> Result<Score<T::Move>, DefinitionError> {
        let engine = self.engine;
        let system = engine.system.as_ref();
        self.stats.nodes += 1;

        let joints = system.legal_joint_moves(state, &engine.agent, &action)?;
        let count = joints.len();
        let mut worst: Option<Score<T::Move>> = None;

        for (i, joint) in joints.iter().enumerate() {
            let child_end = share_of(slice_end, count - i);
            let next = system.next_state(state, joint)?;
            let score = self.max_r(&next, depth + 1, alpha, beta, child_end)?;
            let current = match worst {
                Some(worst) => worst.worse_of(score),
                None => score,
            };
            beta = beta.min(current.value);
            worst = Some(current);

            if beta <= alpha {
                if i + 1 < count {
                    self.stats.cutoffs += 1;
                }
                break;
            }
        }

        match worst {
            Some(score) => Ok(score.tagged(action)),
            None => Err(DefinitionError::NoJointMoves {
                state: format!("{state:?}"),
                action: format!("{action:?}"),
            }),
        }
    }

    fn out_of_budget(&self, depth: u32, slice_end: Option<Instant>) -> bool {
        self.engine.config.max_depth.is_some_and(|max| depth >= max)
            || slice_end.is_some_and(|end| Instant::now() >= end)
            || self.token.is_cancelled()
    }
}

/// End of the time share for the next of `remaining` siblings.
fn share_of(slice_end: Option<Instant>, remaining: usize) -> Option<Instant> {
    slice_end.map(|end| {
        let now = Instant::now();
        let left = end.saturating_duration_since(now);
        now + left / remaining.max(1) as u32
    })
}
