//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values,
//! plus conversions into the engine crates' own config types.

use std::time::Duration;

use crate::defaults;
use mcts::{MctsConfig, ParallelMode};
use minimax::AlphaBetaConfig;
use serde::Deserialize;
use tracing::warn;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_start_clock() -> u64 {
    defaults::start_clock_secs()
}
fn d_play_clock() -> u64 {
    defaults::play_clock_secs()
}
fn d_games() -> u32 {
    defaults::games()
}
fn d_x_engine() -> String {
    defaults::x_engine().into()
}
fn d_o_engine() -> String {
    defaults::o_engine().into()
}
fn d_max_depth() -> i32 {
    defaults::max_depth()
}
fn d_time_sliced() -> bool {
    defaults::time_sliced()
}
fn d_minimax_margin() -> u64 {
    defaults::minimax_safety_margin_ms()
}
fn d_heuristic() -> String {
    defaults::heuristic().into()
}
fn d_heuristic_value() -> i32 {
    defaults::heuristic_value()
}
fn d_exploration() -> f64 {
    defaults::exploration()
}
fn d_depth_charges() -> u32 {
    defaults::depth_charges()
}
fn d_threads() -> usize {
    defaults::threads()
}
fn d_mode() -> String {
    defaults::mode().into()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_mcts_margin() -> u64 {
    defaults::mcts_safety_margin_ms()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default, rename = "match")]
    pub match_settings: MatchSettings,
    #[serde(default)]
    pub minimax: MinimaxSettings,
    #[serde(default)]
    pub mcts: MctsSettings,
}

/// Settings shared by every component
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
        }
    }
}

/// Clocks and seating for a match
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MatchSettings {
    #[serde(default = "d_start_clock")]
    pub start_clock_secs: u64,
    #[serde(default = "d_play_clock")]
    pub play_clock_secs: u64,
    #[serde(default = "d_games")]
    pub games: u32,
    #[serde(default = "d_x_engine")]
    pub x_engine: String,
    #[serde(default = "d_o_engine")]
    pub o_engine: String,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            start_clock_secs: defaults::start_clock_secs(),
            play_clock_secs: defaults::play_clock_secs(),
            games: defaults::games(),
            x_engine: defaults::x_engine().into(),
            o_engine: defaults::o_engine().into(),
        }
    }
}

/// Alpha-beta and full-width minimax settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MinimaxSettings {
    /// Negative values disable the depth bound
    #[serde(default = "d_max_depth")]
    pub max_depth: i32,
    #[serde(default = "d_time_sliced")]
    pub time_sliced: bool,
    #[serde(default = "d_minimax_margin")]
    pub safety_margin_ms: u64,
    #[serde(default = "d_heuristic")]
    pub heuristic: String,
    #[serde(default = "d_heuristic_value")]
    pub heuristic_value: i32,
}

impl Default for MinimaxSettings {
    fn default() -> Self {
        Self {
            max_depth: defaults::max_depth(),
            time_sliced: defaults::time_sliced(),
            safety_margin_ms: defaults::minimax_safety_margin_ms(),
            heuristic: defaults::heuristic().into(),
            heuristic_value: defaults::heuristic_value(),
        }
    }
}

impl MinimaxSettings {
    /// Depth bound, `None` when searching to the terminal states.
    pub fn depth_bound(&self) -> Option<u32> {
        u32::try_from(self.max_depth).ok()
    }

    /// Build the alpha-beta engine config.
    pub fn to_engine_config(&self) -> AlphaBetaConfig {
        AlphaBetaConfig::default()
            .with_max_depth(self.depth_bound())
            .with_time_slicing(self.time_sliced)
            .with_safety_margin(Duration::from_millis(self.safety_margin_ms))
    }
}

/// Monte Carlo Tree Search settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsSettings {
    #[serde(default = "d_exploration")]
    pub exploration: f64,
    #[serde(default = "d_depth_charges")]
    pub depth_charges: u32,
    #[serde(default = "d_threads")]
    pub threads: usize,
    #[serde(default = "d_mode")]
    pub mode: String,
    #[serde(default = "d_seed")]
    pub seed: u64,
    #[serde(default = "d_mcts_margin")]
    pub safety_margin_ms: u64,
}

impl Default for MctsSettings {
    fn default() -> Self {
        Self {
            exploration: defaults::exploration(),
            depth_charges: defaults::depth_charges(),
            threads: defaults::threads(),
            mode: defaults::mode().into(),
            seed: defaults::seed(),
            safety_margin_ms: defaults::mcts_safety_margin_ms(),
        }
    }
}

impl MctsSettings {
    /// Concurrency strategy named by `mode`. Unknown names fall back to the
    /// shared tree.
    pub fn parallel_mode(&self) -> ParallelMode {
        match self.mode.as_str() {
            "shared" => ParallelMode::SharedTree,
            "independent" => ParallelMode::IndependentTrees,
            other => {
                warn!(mode = other, "Unknown MCTS mode, using shared tree");
                ParallelMode::SharedTree
            }
        }
    }

    /// Build the MCTS engine config.
    pub fn to_engine_config(&self) -> MctsConfig {
        MctsConfig::default()
            .with_exploration(self.exploration)
            .with_depth_charges(self.depth_charges)
            .with_threads(self.threads)
            .with_mode(self.parallel_mode())
            .with_seed(self.seed)
            .with_safety_margin(Duration::from_millis(self.safety_margin_ms))
    }
}
