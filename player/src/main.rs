//! Player - match runner for the search engines
//!
//! Plays TicTacToe matches under GGP-style clocks:
//! 1. A start clock during which engines may prepare (MCTS grows its tree)
//! 2. A play clock per move, with every seat asked for its move each turn
//! 3. A summary of wins, losses and draws once all games are played

use anyhow::Result;
use clap::Parser;
use games_tictactoe::{Mark, State, TicTacToe};
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod runner;
mod seat;

use crate::config::Config;
use crate::runner::MatchRunner;
use crate::seat::Seat;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Tally of finished games.
#[derive(Debug, Default)]
struct Tally {
    x_wins: u32,
    o_wins: u32,
    draws: u32,
}

fn play_matches(config: &Config) -> Result<Tally> {
    let game = Arc::new(TicTacToe::new());
    let [x_engine, o_engine] = config.engines()?;
    let mut tally = Tally::default();

    for game_index in 0..config.games {
        let mut options = config.seat_options();
        options.seed = options.seed.wrapping_add(game_index as u64);
        let seats = [
            Seat::new(x_engine, game.clone(), Mark::X, State::new(), &options),
            Seat::new(o_engine, game.clone(), Mark::O, State::new(), &options),
        ];

        info!(game = game_index + 1, ?x_engine, ?o_engine, "Starting game");
        let mut runner =
            MatchRunner::new(game.clone(), seats, config.start_clock(), config.play_clock());
        let outcome = runner.run(State::new())?;

        match outcome.winner() {
            Some(Mark::X) => tally.x_wins += 1,
            Some(Mark::O) => tally.o_wins += 1,
            None => tally.draws += 1,
        }
    }

    Ok(tally)
}

fn main() -> Result<()> {
    eprintln!("Player starting...");

    // Parse configuration
    let config = Config::parse();

    // Validate configuration
    config.validate()?;

    // Initialize tracing
    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    info!(
        games = config.games,
        x_engine = %config.x_engine,
        o_engine = %config.o_engine,
        start_clock_secs = config.start_clock_secs,
        play_clock_secs = config.play_clock_secs,
        "Match configured"
    );

    match play_matches(&config) {
        Ok(tally) => {
            info!(
                x_wins = tally.x_wins,
                o_wins = tally.o_wins,
                draws = tally.draws,
                "Match complete"
            );
            Ok(())
        }
        Err(e) => {
            error!("Match failed: {}", e);
            Err(e)
        }
    }
}
