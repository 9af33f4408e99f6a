//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DELIBERATE_CONFIG";

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",    // Current directory
    "../config.toml", // Parent directory (when running from subdirectory)
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by the DELIBERATE_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_ENV_VAR, path.display());
            return load_from_path(&path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_ENV_VAR,
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(&path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (i32, u64, f64, bool, ...); unparseable values are
    // reported and ignored
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(raw) = std::env::var($key) {
            match raw.parse() {
                Ok(v) => $config.$section.$field = v,
                Err(_) => warn!(key = $key, value = %raw, "Ignoring unparseable override"),
            }
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: DELIBERATE_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.log_level, "DELIBERATE_COMMON_LOG_LEVEL");

    // Match
    env_override!(
        config,
        match_settings.start_clock_secs,
        "DELIBERATE_MATCH_START_CLOCK_SECS",
        parse
    );
    env_override!(
        config,
        match_settings.play_clock_secs,
        "DELIBERATE_MATCH_PLAY_CLOCK_SECS",
        parse
    );
    env_override!(config, match_settings.games, "DELIBERATE_MATCH_GAMES", parse);
    env_override!(config, match_settings.x_engine, "DELIBERATE_MATCH_X_ENGINE");
    env_override!(config, match_settings.o_engine, "DELIBERATE_MATCH_O_ENGINE");

    // Minimax
    env_override!(
        config,
        minimax.max_depth,
        "DELIBERATE_MINIMAX_MAX_DEPTH",
        parse
    );
    env_override!(
        config,
        minimax.time_sliced,
        "DELIBERATE_MINIMAX_TIME_SLICED",
        parse
    );
    env_override!(
        config,
        minimax.safety_margin_ms,
        "DELIBERATE_MINIMAX_SAFETY_MARGIN_MS",
        parse
    );
    env_override!(config, minimax.heuristic, "DELIBERATE_MINIMAX_HEURISTIC");
    env_override!(
        config,
        minimax.heuristic_value,
        "DELIBERATE_MINIMAX_HEURISTIC_VALUE",
        parse
    );

    // MCTS
    env_override!(
        config,
        mcts.exploration,
        "DELIBERATE_MCTS_EXPLORATION",
        parse
    );
    env_override!(
        config,
        mcts.depth_charges,
        "DELIBERATE_MCTS_DEPTH_CHARGES",
        parse
    );
    env_override!(config, mcts.threads, "DELIBERATE_MCTS_THREADS", parse);
    env_override!(config, mcts.mode, "DELIBERATE_MCTS_MODE");
    env_override!(config, mcts.seed, "DELIBERATE_MCTS_SEED", parse);
    env_override!(
        config,
        mcts.safety_margin_ms,
        "DELIBERATE_MCTS_SAFETY_MARGIN_MS",
        parse
    );

    config
}
