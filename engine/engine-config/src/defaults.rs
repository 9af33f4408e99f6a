//! Default configuration values loaded from config.defaults.toml.
//!
//! The file is embedded at compile time so the binary and the checked-in
//! defaults can never disagree.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    #[serde(rename = "match")]
    match_settings: MatchDefaults,
    minimax: MinimaxDefaults,
    mcts: MctsDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct MatchDefaults {
    start_clock_secs: u64,
    play_clock_secs: u64,
    games: u32,
    x_engine: String,
    o_engine: String,
}

#[derive(Debug, Deserialize)]
struct MinimaxDefaults {
    max_depth: i32,
    time_sliced: bool,
    safety_margin_ms: u64,
    heuristic: String,
    heuristic_value: i32,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    exploration: f64,
    depth_charges: u32,
    threads: usize,
    mode: String,
    seed: u64,
    safety_margin_ms: u64,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// Match
pub fn start_clock_secs() -> u64 {
    DEFAULTS.match_settings.start_clock_secs
}
pub fn play_clock_secs() -> u64 {
    DEFAULTS.match_settings.play_clock_secs
}
pub fn games() -> u32 {
    DEFAULTS.match_settings.games
}
pub fn x_engine() -> &'static str {
    &DEFAULTS.match_settings.x_engine
}
pub fn o_engine() -> &'static str {
    &DEFAULTS.match_settings.o_engine
}

// Minimax
pub fn max_depth() -> i32 {
    DEFAULTS.minimax.max_depth
}
pub fn time_sliced() -> bool {
    DEFAULTS.minimax.time_sliced
}
pub fn minimax_safety_margin_ms() -> u64 {
    DEFAULTS.minimax.safety_margin_ms
}
pub fn heuristic() -> &'static str {
    &DEFAULTS.minimax.heuristic
}
pub fn heuristic_value() -> i32 {
    DEFAULTS.minimax.heuristic_value
}

// MCTS
pub fn exploration() -> f64 {
    DEFAULTS.mcts.exploration
}
pub fn depth_charges() -> u32 {
    DEFAULTS.mcts.depth_charges
}
pub fn threads() -> usize {
    DEFAULTS.mcts.threads
}
pub fn mode() -> &'static str {
    &DEFAULTS.mcts.mode
}
pub fn seed() -> u64 {
    DEFAULTS.mcts.seed
}
pub fn mcts_safety_margin_ms() -> u64 {
    DEFAULTS.mcts.safety_margin_ms
}
