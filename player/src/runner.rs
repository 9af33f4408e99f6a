//! Match loop: start clock, then one joint move per turn until the game ends.

use anyhow::{anyhow, Result};
use engine_core::TransitionSystem;
use games_tictactoe::{Action, Mark, State, TicTacToe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::seat::Seat;

/// Final result of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Goal values for X and O
    pub goals: [i32; 2],
    /// Moves of the player to move, in order
    pub moves: Vec<Action>,
    pub final_state: State,
}

impl MatchOutcome {
    pub fn winner(&self) -> Option<Mark> {
        self.final_state.winner()
    }
}

/// Runs one game between two seats.
pub struct MatchRunner {
    game: Arc<TicTacToe>,
    seats: [Seat; 2],
    start_clock: Duration,
    play_clock: Duration,
}

impl MatchRunner {
    /// `seats` are ordered X, O.
    pub fn new(
        game: Arc<TicTacToe>,
        seats: [Seat; 2],
        start_clock: Duration,
        play_clock: Duration,
    ) -> Self {
        Self {
            game,
            seats,
            start_clock,
            play_clock,
        }
    }

    /// Play from `initial` to a terminal state.
    ///
    /// Every seat is asked for its move each turn, all under the same play
    /// clock, and the answers form the joint move. Seats run concurrently.
    pub fn run(&mut self, initial: State) -> Result<MatchOutcome> {
        let deadline = Instant::now() + self.start_clock;
        self.for_each_seat(|seat| seat.prepare(deadline))?;

        let mut state = initial;
        let mut moves = Vec::new();
        while !self.game.is_terminal(&state) {
            let mover = state.current_player();
            let started = Instant::now();
            let deadline = started + self.play_clock;

            let joint = self.for_each_seat(|seat| seat.play(&state, deadline))?;
            let elapsed = started.elapsed();
            if elapsed > self.play_clock {
                warn!(
                    player = ?mover,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Play clock exceeded"
                );
            }

            let action = joint[mover.index()];
            info!(
                turn = moves.len() + 1,
                player = ?mover,
                engine = ?self.seats[mover.index()].kind(),
                ?action,
                elapsed_ms = elapsed.as_millis() as u64,
                "Move played"
            );

            state = self.game.next_state(&state, &joint)?;
            moves.push(action);
        }

        let goals = [
            self.game.goal(&state, &Mark::X)?,
            self.game.goal(&state, &Mark::O)?,
        ];
        info!(
            x_goal = goals[0],
            o_goal = goals[1],
            winner = ?state.winner(),
            turns = moves.len(),
            "Game over"
        );

        Ok(MatchOutcome {
            goals,
            moves,
            final_state: state,
        })
    }

    /// Run `f` on both seats in parallel, results in seat order.
    fn for_each_seat<R, F>(&mut self, f: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&mut Seat) -> Result<R> + Sync,
    {
        let f = &f;
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .seats
                .iter_mut()
                .map(|seat| scope.spawn(move || f(seat)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| anyhow!("seat thread panicked"))?
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seat::{EngineKind, Heuristic, SeatOptions};
    use games_tictactoe::{DRAW, WIN};
    use mcts::MctsConfig;
    use minimax::AlphaBetaConfig;

    fn options(seed: u64) -> SeatOptions {
        SeatOptions {
            alphabeta: AlphaBetaConfig::for_testing(),
            depth_bound: None,
            heuristic: Heuristic::constant(50),
            mcts: MctsConfig::for_testing().with_threads(2),
            seed,
        }
    }

    fn runner(x: EngineKind, o: EngineKind, seed: u64, clock: Duration) -> MatchRunner {
        let game = Arc::new(TicTacToe::new());
        let options = options(seed);
        let seats = [
            Seat::new(x, game.clone(), Mark::X, State::new(), &options),
            Seat::new(o, game.clone(), Mark::O, State::new(), &options),
        ];
        MatchRunner::new(game, seats, clock, clock)
    }

    #[test]
    fn test_random_game_reaches_terminal_state() {
        let mut runner = runner(EngineKind::Random, EngineKind::Random, 5, Duration::ZERO);
        let outcome = runner.run(State::new()).unwrap();

        assert!(outcome.final_state.is_done());
        assert!((5..=9).contains(&outcome.moves.len()));
        assert_eq!(outcome.goals[0] + outcome.goals[1], WIN);
        assert!(outcome.moves.iter().all(|m| *m != Action::Noop));
    }

    #[test]
    fn test_alphabeta_never_loses_to_random() {
        for seed in 0..5 {
            let mut runner = runner(
                EngineKind::Random,
                EngineKind::AlphaBeta,
                seed,
                Duration::from_secs(30),
            );
            let outcome = runner.run(State::new()).unwrap();
            assert!(outcome.goals[1] >= DRAW, "seed {seed}: {outcome:?}");
        }
    }

    #[test]
    fn test_perfect_players_draw() {
        let mut runner = runner(
            EngineKind::AlphaBeta,
            EngineKind::Minimax,
            0,
            Duration::from_secs(30),
        );
        let outcome = runner.run(State::new().make_move(4)).unwrap();
        assert_eq!(outcome.goals, [DRAW, DRAW]);
        assert_eq!(outcome.winner(), None);
    }

    #[test]
    fn test_mcts_game_completes_under_clock() {
        let mut runner = runner(
            EngineKind::Mcts,
            EngineKind::Random,
            1,
            Duration::from_millis(60),
        );
        let outcome = runner.run(State::new()).unwrap();
        assert!(outcome.final_state.is_done());
        assert_eq!(outcome.goals[0] + outcome.goals[1], WIN);
    }
}
