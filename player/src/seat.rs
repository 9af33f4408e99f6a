//! Engines that can occupy a seat in a match.

use anyhow::{anyhow, Result};
use engine_core::{DefinitionError, TransitionSystem};
use games_tictactoe::{Action, Mark, State, TicTacToe};
use mcts::{MctsConfig, MctsTree, ParallelSearch};
use minimax::{AlphaBeta, AlphaBetaConfig, ConstantHeuristic, GoalProximity, LeafEvaluator, Minimax};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Engine choice for a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    AlphaBeta,
    Minimax,
    Mcts,
    Random,
}

impl FromStr for EngineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "alphabeta" => Ok(EngineKind::AlphaBeta),
            "minimax" => Ok(EngineKind::Minimax),
            "mcts" => Ok(EngineKind::Mcts),
            "random" => Ok(EngineKind::Random),
            other => Err(anyhow!(
                "unknown engine '{other}', expected alphabeta, minimax, mcts or random"
            )),
        }
    }
}

/// Leaf evaluator chosen at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    Constant(ConstantHeuristic),
    Goal(GoalProximity),
}

impl Heuristic {
    pub fn constant(value: i32) -> Self {
        Heuristic::Constant(ConstantHeuristic(value))
    }

    pub fn goal(fallback: i32) -> Self {
        Heuristic::Goal(GoalProximity { fallback })
    }
}

impl<T: TransitionSystem> LeafEvaluator<T> for Heuristic {
    fn evaluate(
        &self,
        system: &T,
        state: &T::State,
        agent: &T::Agent,
    ) -> Result<i32, DefinitionError> {
        match self {
            Heuristic::Constant(h) => h.evaluate(system, state, agent),
            Heuristic::Goal(h) => h.evaluate(system, state, agent),
        }
    }
}

/// Engine parameters shared by both seats.
#[derive(Debug, Clone)]
pub struct SeatOptions {
    pub alphabeta: AlphaBetaConfig,
    /// Depth bound of the full-width minimax seat
    pub depth_bound: Option<u32>,
    pub heuristic: Heuristic,
    pub mcts: MctsConfig,
    pub seed: u64,
}

/// One player in a match.
pub enum Seat {
    AlphaBeta(AlphaBeta<TicTacToe, Heuristic>),
    /// Full-width search with no time control: a move can overrun the play
    /// clock, so only the depth bound keeps it in time. The CLI refuses an
    /// unbounded minimax seat.
    Minimax(Minimax<TicTacToe, Heuristic>),
    Mcts(Box<MctsTree<TicTacToe>>),
    Random {
        game: Arc<TicTacToe>,
        mark: Mark,
        rng: ChaCha20Rng,
    },
}

impl Seat {
    /// Build the engine for `mark`, rooted at the match's initial state.
    pub fn new(
        kind: EngineKind,
        game: Arc<TicTacToe>,
        mark: Mark,
        initial: State,
        options: &SeatOptions,
    ) -> Self {
        // Distinct streams per seat even when both run the same engine
        let seed = options.seed.wrapping_add(mark.index() as u64 * 1000);
        match kind {
            EngineKind::AlphaBeta => Seat::AlphaBeta(AlphaBeta::new(
                game,
                mark,
                options.heuristic,
                options.alphabeta.clone(),
            )),
            EngineKind::Minimax => Seat::Minimax(Minimax::new(
                game,
                mark,
                options.heuristic,
                options.depth_bound,
            )),
            EngineKind::Mcts => Seat::Mcts(Box::new(MctsTree::new(
                game,
                mark,
                initial,
                options.mcts.clone().with_seed(seed),
            ))),
            EngineKind::Random => Seat::Random {
                game,
                mark,
                rng: ChaCha20Rng::seed_from_u64(seed),
            },
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            Seat::AlphaBeta(_) => EngineKind::AlphaBeta,
            Seat::Minimax(_) => EngineKind::Minimax,
            Seat::Mcts(_) => EngineKind::Mcts,
            Seat::Random { .. } => EngineKind::Random,
        }
    }

    /// Use the start clock. Only MCTS has anything to do before the first
    /// move: it grows its tree from the initial state.
    pub fn prepare(&mut self, deadline: Instant) -> Result<()> {
        if let Seat::Mcts(tree) = self {
            let stats = ParallelSearch::run(tree.as_mut(), deadline)?;
            debug!(
                iterations = stats.iterations,
                root_visits = tree.root().visits(),
                "Start clock search complete"
            );
        }
        Ok(())
    }

    /// This seat's move in `state`, due before `deadline`.
    pub fn play(&mut self, state: &State, deadline: Instant) -> Result<Action> {
        let action = match self {
            Seat::AlphaBeta(engine) => engine.select_move(state, deadline)?,
            // Ignores `deadline`; see the variant docs
            Seat::Minimax(engine) => engine.select_move(state)?,
            Seat::Mcts(tree) => {
                let update = tree.update_root(state);
                let stats = ParallelSearch::run(tree.as_mut(), deadline)?;
                let summary = tree.stats();
                debug!(
                    ?update,
                    iterations = stats.iterations,
                    root_visits = summary.root_visits,
                    tree_nodes = summary.total_nodes,
                    "MCTS turn search complete"
                );
                tree.choose_move()?
            }
            Seat::Random { game, mark, rng } => {
                let moves = game.legal_moves(state, mark)?;
                *moves
                    .choose(rng)
                    .ok_or_else(|| anyhow!("no legal move for {mark:?}"))?
            }
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn options() -> SeatOptions {
        SeatOptions {
            alphabeta: AlphaBetaConfig::for_testing(),
            depth_bound: None,
            heuristic: Heuristic::constant(50),
            mcts: MctsConfig::for_testing().with_threads(2),
            seed: 3,
        }
    }

    fn seat(kind: EngineKind, mark: Mark, state: State) -> Seat {
        Seat::new(kind, Arc::new(TicTacToe::new()), mark, state, &options())
    }

    #[test]
    fn test_engine_kind_parse() {
        assert_eq!("alphabeta".parse::<EngineKind>().unwrap(), EngineKind::AlphaBeta);
        assert_eq!("minimax".parse::<EngineKind>().unwrap(), EngineKind::Minimax);
        assert_eq!("mcts".parse::<EngineKind>().unwrap(), EngineKind::Mcts);
        assert_eq!("random".parse::<EngineKind>().unwrap(), EngineKind::Random);
        assert!("MCTS".parse::<EngineKind>().is_err());
    }

    #[test]
    fn test_heuristic_dispatch() {
        let game = TicTacToe::new();
        let open = State::new();
        let won = State::from_board([1, 1, 1, 2, 2, 0, 0, 0, 0]);

        assert_eq!(Heuristic::constant(42).evaluate(&game, &open, &Mark::X).unwrap(), 42);
        assert_eq!(Heuristic::goal(30).evaluate(&game, &open, &Mark::X).unwrap(), 30);
        assert_eq!(Heuristic::goal(30).evaluate(&game, &won, &Mark::X).unwrap(), 100);
    }

    #[test]
    fn test_every_engine_takes_the_win() {
        let state = State::from_board([1, 1, 0, 2, 2, 0, 0, 0, 0]);
        for kind in [EngineKind::AlphaBeta, EngineKind::Minimax, EngineKind::Mcts] {
            let mut seat = seat(kind, Mark::X, state);
            assert_eq!(seat.kind(), kind);
            let action = seat
                .play(&state, Instant::now() + Duration::from_millis(200))
                .unwrap();
            assert_eq!(action, Action::Place(2), "{kind:?}");
        }
    }

    #[test]
    fn test_idle_seat_plays_noop() {
        let state = State::new();
        for kind in [EngineKind::AlphaBeta, EngineKind::Minimax, EngineKind::Random] {
            let mut seat = seat(kind, Mark::O, state);
            let action = seat
                .play(&state, Instant::now() + Duration::from_millis(50))
                .unwrap();
            assert_eq!(action, Action::Noop, "{kind:?}");
        }
    }

    #[test]
    fn test_random_seat_plays_legal_moves() {
        let state = State::from_board([1, 2, 1, 2, 0, 0, 0, 0, 0]);
        let mut seat = seat(EngineKind::Random, Mark::X, state);
        for _ in 0..20 {
            match seat.play(&state, Instant::now()).unwrap() {
                Action::Place(pos) => assert!(pos >= 4),
                Action::Noop => panic!("X is to move"),
            }
        }
    }

    #[test]
    fn test_mcts_prepare_grows_tree() {
        let mut seat = seat(EngineKind::Mcts, Mark::X, State::new());
        seat.prepare(Instant::now() + Duration::from_millis(50)).unwrap();
        match &seat {
            Seat::Mcts(tree) => assert!(tree.root().visits() > 0),
            _ => unreachable!(),
        }
    }
}
