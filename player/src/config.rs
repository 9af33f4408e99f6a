//! Configuration for the match runner
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig, MctsSettings, MinimaxSettings};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::level_filters::LevelFilter;

use crate::seat::{EngineKind, Heuristic, SeatOptions};

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

// Default value functions that read from central config
fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_start_clock() -> u64 {
    CENTRAL_CONFIG.match_settings.start_clock_secs
}

fn default_play_clock() -> u64 {
    CENTRAL_CONFIG.match_settings.play_clock_secs
}

fn default_games() -> u32 {
    CENTRAL_CONFIG.match_settings.games
}

fn default_x_engine() -> String {
    CENTRAL_CONFIG.match_settings.x_engine.clone()
}

fn default_o_engine() -> String {
    CENTRAL_CONFIG.match_settings.o_engine.clone()
}

fn default_max_depth() -> i32 {
    CENTRAL_CONFIG.minimax.max_depth
}

fn default_heuristic() -> String {
    CENTRAL_CONFIG.minimax.heuristic.clone()
}

fn default_heuristic_value() -> i32 {
    CENTRAL_CONFIG.minimax.heuristic_value
}

fn default_threads() -> usize {
    CENTRAL_CONFIG.mcts.threads
}

fn default_mcts_mode() -> String {
    CENTRAL_CONFIG.mcts.mode.clone()
}

fn default_depth_charges() -> u32 {
    CENTRAL_CONFIG.mcts.depth_charges
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.mcts.seed
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "player")]
#[command(about = "Plays TicTacToe matches between search engines")]
#[command(
    long_about = "Runs full matches under a start clock and a per-move play clock,
with a configurable engine on each seat (alphabeta, minimax, mcts, random).

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Seconds engines may prepare before the first move
    #[arg(long, default_value_t = default_start_clock())]
    pub start_clock_secs: u64,

    /// Seconds allowed per move
    #[arg(long, default_value_t = default_play_clock())]
    pub play_clock_secs: u64,

    /// Number of games to play
    #[arg(long, default_value_t = default_games())]
    pub games: u32,

    /// Engine playing X
    #[arg(long, default_value_t = default_x_engine())]
    pub x_engine: String,

    /// Engine playing O
    #[arg(long, default_value_t = default_o_engine())]
    pub o_engine: String,

    /// Minimax depth bound (-1 searches to the end of the game)
    #[arg(long, default_value_t = default_max_depth(), allow_negative_numbers = true)]
    pub max_depth: i32,

    /// Leaf heuristic for depth-bounded minimax (constant, goal)
    #[arg(long, default_value_t = default_heuristic())]
    pub heuristic: String,

    /// Value of the constant heuristic, or the fallback of the goal heuristic
    #[arg(long, default_value_t = default_heuristic_value())]
    pub heuristic_value: i32,

    /// MCTS worker threads
    #[arg(long, default_value_t = default_threads())]
    pub threads: usize,

    /// MCTS concurrency strategy (shared, independent)
    #[arg(long, default_value_t = default_mcts_mode())]
    pub mcts_mode: String,

    /// Random playouts averaged per MCTS simulation
    #[arg(long, default_value_t = default_depth_charges())]
    pub depth_charges: u32,

    /// Base seed for MCTS playouts and random seats
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        if self.play_clock_secs == 0 {
            return Err(anyhow!("play_clock_secs must be greater than 0"));
        }

        if self.games == 0 {
            return Err(anyhow!("games must be greater than 0"));
        }

        let x = self
            .x_engine
            .parse::<EngineKind>()
            .map_err(|e| anyhow!("x_engine: {e}"))?;
        let o = self
            .o_engine
            .parse::<EngineKind>()
            .map_err(|e| anyhow!("o_engine: {e}"))?;

        // Full-width minimax has no clock; only a depth bound limits it
        if self.max_depth < 0 && (x == EngineKind::Minimax || o == EngineKind::Minimax) {
            return Err(anyhow!(
                "minimax engine ignores the play clock and needs max_depth >= 0"
            ));
        }

        if !matches!(self.heuristic.as_str(), "constant" | "goal") {
            return Err(anyhow!(
                "invalid heuristic '{}', expected constant or goal",
                self.heuristic
            ));
        }

        if !(0..=100).contains(&self.heuristic_value) {
            return Err(anyhow!("heuristic_value must be between 0 and 100"));
        }

        if self.threads == 0 {
            return Err(anyhow!("threads must be greater than 0"));
        }

        if !matches!(self.mcts_mode.as_str(), "shared" | "independent") {
            return Err(anyhow!(
                "invalid mcts_mode '{}', expected shared or independent",
                self.mcts_mode
            ));
        }

        if self.depth_charges == 0 {
            return Err(anyhow!("depth_charges must be greater than 0"));
        }

        Ok(())
    }

    pub fn start_clock(&self) -> Duration {
        Duration::from_secs(self.start_clock_secs)
    }

    pub fn play_clock(&self) -> Duration {
        Duration::from_secs(self.play_clock_secs)
    }

    /// Engines for X and O, in that order.
    pub fn engines(&self) -> Result<[EngineKind; 2]> {
        Ok([self.x_engine.parse()?, self.o_engine.parse()?])
    }

    /// Minimax settings from config.toml with the CLI values applied.
    pub fn minimax_settings(&self) -> MinimaxSettings {
        MinimaxSettings {
            max_depth: self.max_depth,
            heuristic: self.heuristic.clone(),
            heuristic_value: self.heuristic_value,
            ..CENTRAL_CONFIG.minimax.clone()
        }
    }

    /// MCTS settings from config.toml with the CLI values applied.
    pub fn mcts_settings(&self) -> MctsSettings {
        MctsSettings {
            threads: self.threads,
            mode: self.mcts_mode.clone(),
            depth_charges: self.depth_charges,
            seed: self.seed,
            ..CENTRAL_CONFIG.mcts.clone()
        }
    }

    /// Everything a seat needs to build its engine.
    pub fn seat_options(&self) -> SeatOptions {
        let minimax = self.minimax_settings();
        let heuristic = match minimax.heuristic.as_str() {
            "goal" => Heuristic::goal(minimax.heuristic_value),
            _ => Heuristic::constant(minimax.heuristic_value),
        };
        SeatOptions {
            alphabeta: minimax.to_engine_config(),
            depth_bound: minimax.depth_bound(),
            heuristic,
            mcts: self.mcts_settings().to_engine_config(),
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcts::ParallelMode;

    fn base_config() -> Config {
        Config {
            log_level: "info".into(),
            start_clock_secs: 5,
            play_clock_secs: 2,
            games: 1,
            x_engine: "mcts".into(),
            o_engine: "alphabeta".into(),
            max_depth: 4,
            heuristic: "constant".into(),
            heuristic_value: 50,
            threads: 2,
            mcts_mode: "shared".into(),
            depth_charges: 8,
            seed: 1,
        }
    }

    #[test]
    fn validate_accepts_valid_configuration() {
        let cfg = base_config();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut cfg = base_config();
        cfg.log_level = "nope".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn validate_rejects_zero_play_clock() {
        let mut cfg = base_config();
        cfg.play_clock_secs = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("play_clock_secs"));
    }

    #[test]
    fn validate_rejects_unknown_engine() {
        let mut cfg = base_config();
        cfg.o_engine = "oracle".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("o_engine"));
    }

    #[test]
    fn validate_rejects_unknown_heuristic() {
        let mut cfg = base_config();
        cfg.heuristic = "vibes".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("invalid heuristic"));
    }

    #[test]
    fn validate_rejects_out_of_range_heuristic_value() {
        let mut cfg = base_config();
        cfg.heuristic_value = 101;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("heuristic_value"));
    }

    #[test]
    fn validate_rejects_zero_threads() {
        let mut cfg = base_config();
        cfg.threads = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("threads"));
    }

    #[test]
    fn validate_rejects_unknown_mcts_mode() {
        let mut cfg = base_config();
        cfg.mcts_mode = "forked".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("mcts_mode"));
    }

    #[test]
    fn validate_accepts_unbounded_depth() {
        let mut cfg = base_config();
        cfg.max_depth = -1;
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.seat_options().depth_bound, None);
    }

    #[test]
    fn validate_rejects_unbounded_minimax_seat() {
        let mut cfg = base_config();
        cfg.x_engine = "minimax".into();
        assert!(cfg.validate().is_ok());

        cfg.max_depth = -1;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_depth"));

        // Alpha-beta stays clocked without a depth bound
        cfg.x_engine = "alphabeta".into();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn clocks_return_correct_durations() {
        let cfg = base_config();
        assert_eq!(cfg.start_clock(), Duration::from_secs(5));
        assert_eq!(cfg.play_clock(), Duration::from_secs(2));
    }

    #[test]
    fn engines_parse_in_seat_order() {
        let cfg = base_config();
        assert_eq!(cfg.engines().unwrap(), [EngineKind::Mcts, EngineKind::AlphaBeta]);
    }

    #[test]
    fn seat_options_apply_cli_values() {
        let mut cfg = base_config();
        cfg.mcts_mode = "independent".into();
        cfg.heuristic = "goal".into();
        cfg.heuristic_value = 30;

        let options = cfg.seat_options();
        assert_eq!(options.alphabeta.max_depth, Some(4));
        assert_eq!(options.depth_bound, Some(4));
        assert_eq!(options.heuristic, Heuristic::goal(30));
        assert_eq!(options.mcts.threads, 2);
        assert_eq!(options.mcts.mode, ParallelMode::IndependentTrees);
        assert_eq!(options.mcts.seed, 1);
    }

    #[test]
    fn cli_overrides_defaults() {
        let cfg = Config::try_parse_from([
            "player",
            "--x-engine",
            "random",
            "--max-depth",
            "-1",
            "--play-clock-secs",
            "7",
        ])
        .unwrap();
        assert_eq!(cfg.x_engine, "random");
        assert_eq!(cfg.max_depth, -1);
        assert_eq!(cfg.play_clock_secs, 7);
    }
}
