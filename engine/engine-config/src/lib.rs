//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic shared by
//! the search engines and the match runner.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`DELIBERATE_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (config.defaults.toml, embedded)
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! DELIBERATE_<SECTION>_<KEY>=value
//!
//! Examples:
//!     DELIBERATE_COMMON_LOG_LEVEL=debug
//!     DELIBERATE_MATCH_PLAY_CLOCK_SECS=15
//!     DELIBERATE_MINIMAX_MAX_DEPTH=-1
//!     DELIBERATE_MCTS_MODE=independent
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_ENV_VAR, CONFIG_SEARCH_PATHS};
pub use structs::*;

#[cfg(test)]
mod tests;
