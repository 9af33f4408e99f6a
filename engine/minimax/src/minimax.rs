//! Full-width minimax without pruning or time control.
//!
//! Visits every node down to the depth bound (or to the terminal states when
//! unbounded). Useful for small games and as the reference the alpha-beta
//! engine must agree with.

use std::sync::Arc;

use engine_core::{DefinitionError, Score, SearchError, TransitionSystem};
use tracing::debug;

use crate::heuristic::LeafEvaluator;
use crate::report::{SearchReport, SearchStats};

/// Exhaustive minimax engine for one agent.
pub struct Minimax<T: TransitionSystem, H> {
    system: Arc<T>,
    agent: T::Agent,
    heuristic: H,
    max_depth: Option<u32>,
}

impl<T, H> Minimax<T, H>
where
    T: TransitionSystem,
    H: LeafEvaluator<T>,
{
    pub fn new(system: Arc<T>, agent: T::Agent, heuristic: H, max_depth: Option<u32>) -> Self {
        Self {
            system,
            agent,
            heuristic,
            max_depth,
        }
    }

    pub fn select_move(&self, state: &T::State) -> Result<T::Move, SearchError> {
        if self.system.is_terminal(state) {
            return Err(SearchError::TerminalRoot);
        }
        if let [only] = self.system.legal_moves(state, &self.agent)?.as_slice() {
            return Ok(only.clone());
        }
        let report = self.search(state)?;
        debug!(
            value = report.score.value,
            action = ?report.score.action,
            nodes = report.stats.nodes,
            terminal_evaluations = report.stats.terminal_evaluations,
            "Minimax search complete"
        );
        report.score.action.ok_or(SearchError::NoLegalMoves)
    }

    pub fn search(&self, state: &T::State) -> Result<SearchReport<T::Move>, SearchError> {
        let mut stats = SearchStats::default();
        let score = self.max_r(state, 0, &mut stats)?;
        Ok(SearchReport { score, stats })
    }

    fn max_r(
        &self,
        state: &T::State,
        depth: u32,
        stats: &mut SearchStats,
    ) -> Result<Score<T::Move>, DefinitionError> {
        stats.nodes += 1;
        if self.system.is_terminal(state) {
            stats.terminal_evaluations += 1;
            return Ok(Score::leaf(self.system.goal(state, &self.agent)?));
        }
        if depth > 0 && self.max_depth.is_some_and(|max| depth >= max) {
            stats.heuristic_evaluations += 1;
            let value = self.heuristic.evaluate(&self.system, state, &self.agent)?;
            return Ok(Score::leaf(value));
        }

        let mut best: Option<Score<T::Move>> = None;
        for action in self.system.legal_moves(state, &self.agent)? {
            let score = self.min_r(state, action, depth, stats)?;
            best = Some(match best {
                Some(best) => best.better_of(score),
                None => score,
            });
        }
        best.ok_or_else(|| DefinitionError::NoLegalMoves {
            state: format!("{state:?}"),
            agent: format!("{:?}", self.agent),
        })
    }

    fn min_r(
        &self,
        state: &T::State,
        action: T::Move,
        depth: u32,
        stats: &mut SearchStats,
    ) -> Result<Score<T::Move>, DefinitionError> {
        stats.nodes += 1;
        let mut worst: Option<Score<T::Move>> = None;
        for joint in self.system.legal_joint_moves(state, &self.agent, &action)? {
            let next = self.system.next_state(state, &joint)?;
            let score = self.max_r(&next, depth + 1, stats)?;
            worst = Some(match worst {
                Some(worst) => worst.worse_of(score),
                None => score,
            });
        }
        match worst {
            Some(score) => Ok(score.tagged(action)),
            None => Err(DefinitionError::NoJointMoves {
                state: format!("{state:?}"),
                action: format!("{action:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::ConstantHeuristic;
    use games_table::TableGame;

    #[test]
    fn test_unbounded_single_agent_visits_every_leaf() {
        let game = Arc::new(TableGame::random_tree(17, 1, 2, 3));
        let agent = "agent0".to_string();
        let engine = Minimax::new(game.clone(), agent.clone(), ConstantHeuristic::default(), None);

        let report = engine.search(&game.initial_state()).unwrap();
        let best_leaf = game
            .terminal_states()
            .map(|leaf| game.goal(leaf, &agent).unwrap())
            .max()
            .unwrap();

        assert_eq!(report.stats.terminal_evaluations, 8);
        assert_eq!(report.stats.heuristic_evaluations, 0);
        assert_eq!(report.score.value, best_leaf);
        assert!(report.score.action.is_some());
    }

    #[test]
    fn test_opponent_minimizes() {
        // Self prefers "safe": "risky" lets the opponent pick the 0 outcome
        let game = TableGame::builder(["me", "you"])
            .transition("root", ["risky", "kind"], "jackpot")
            .transition("root", ["risky", "mean"], "bust")
            .transition("root", ["safe", "kind"], "fair")
            .transition("root", ["safe", "mean"], "fair2")
            .terminal("jackpot", [100, 0])
            .terminal("bust", [0, 100])
            .terminal("fair", [60, 40])
            .terminal("fair2", [55, 45])
            .build()
            .unwrap();
        let engine = Minimax::new(
            Arc::new(game),
            "me".to_string(),
            ConstantHeuristic::default(),
            None,
        );
        let report = engine.search(&"root".to_string()).unwrap();
        assert_eq!(report.score.value, 55);
        assert_eq!(report.score.action.as_deref(), Some("safe"));
    }

    #[test]
    fn test_depth_bound_uses_heuristic() {
        let game = Arc::new(TableGame::random_tree(2, 1, 3, 4));
        let engine = Minimax::new(
            game.clone(),
            "agent0".to_string(),
            ConstantHeuristic(7),
            Some(2),
        );
        let report = engine.search(&game.initial_state()).unwrap();
        assert_eq!(report.score.value, 7);
        assert_eq!(report.stats.heuristic_evaluations, 9);
    }

    #[test]
    fn test_terminal_root_is_rejected() {
        let game = Arc::new(TableGame::random_tree(2, 1, 2, 1));
        let leaf = game.terminal_states().next().unwrap().clone();
        let engine = Minimax::new(game, "agent0".to_string(), ConstantHeuristic::default(), None);
        assert_eq!(engine.select_move(&leaf), Err(SearchError::TerminalRoot));
    }

    #[test]
    fn test_single_legal_move_skips_search() {
        // "stuck" has no rules: searching would fail
        let game = TableGame::builder(["me"])
            .transition("root", ["only"], "stuck")
            .build()
            .unwrap();
        let engine = Minimax::new(
            Arc::new(game),
            "me".to_string(),
            ConstantHeuristic::default(),
            None,
        );
        assert_eq!(engine.select_move(&"root".to_string()).unwrap(), "only");
    }
}
