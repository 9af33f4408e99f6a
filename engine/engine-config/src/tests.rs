//! Tests for the configuration module.

use super::*;
use mcts::ParallelMode;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.log_level, "info");
    assert_eq!(config.match_settings.start_clock_secs, 20);
    assert_eq!(config.match_settings.play_clock_secs, 10);
    assert_eq!(config.match_settings.games, 1);
    assert_eq!(config.match_settings.x_engine, "mcts");
    assert_eq!(config.match_settings.o_engine, "alphabeta");
}

#[test]
fn test_minimax_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.minimax.max_depth, 6);
    assert!(config.minimax.time_sliced);
    assert_eq!(config.minimax.safety_margin_ms, 3000);
    assert_eq!(config.minimax.heuristic, "constant");
    assert_eq!(config.minimax.heuristic_value, 50);
}

#[test]
fn test_mcts_defaults() {
    let config = CentralConfig::default();
    assert!((config.mcts.exploration - 2.0).abs() < f64::EPSILON);
    assert_eq!(config.mcts.depth_charges, 8);
    assert_eq!(config.mcts.threads, 4);
    assert_eq!(config.mcts.mode, "shared");
    assert_eq!(config.mcts.seed, 0);
    assert_eq!(config.mcts.safety_margin_ms, 4000);
}

#[test]
fn test_defaults_match_engine_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.minimax.to_engine_config(), minimax::AlphaBetaConfig::default());
    assert_eq!(config.mcts.to_engine_config(), mcts::MctsConfig::default());
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
log_level = "debug"

[match]
play_clock_secs = 30
x_engine = "minimax"

[minimax]
max_depth = -1
heuristic = "goal"

[mcts]
threads = 8
mode = "independent"
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.log_level, "debug");
    assert_eq!(config.match_settings.play_clock_secs, 30);
    assert_eq!(config.match_settings.x_engine, "minimax");
    assert_eq!(config.minimax.max_depth, -1);
    assert_eq!(config.minimax.heuristic, "goal");
    assert_eq!(config.mcts.threads, 8);
    assert_eq!(config.mcts.mode, "independent");
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[mcts]
depth_charges = 2
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.mcts.depth_charges, 2);
    assert_eq!(config.mcts.threads, 4); // Default
    assert_eq!(config.minimax.max_depth, 6); // Default
    assert_eq!(config.match_settings.o_engine, "alphabeta"); // Default
}

#[test]
fn test_minimax_conversion() {
    let settings = MinimaxSettings {
        max_depth: -1,
        time_sliced: false,
        safety_margin_ms: 250,
        ..MinimaxSettings::default()
    };
    let engine = settings.to_engine_config();
    assert_eq!(engine.max_depth, None);
    assert!(!engine.time_sliced);
    assert_eq!(engine.safety_margin, Duration::from_millis(250));

    let bounded = MinimaxSettings {
        max_depth: 3,
        ..MinimaxSettings::default()
    };
    assert_eq!(bounded.depth_bound(), Some(3));
}

#[test]
fn test_mcts_conversion() {
    let settings = MctsSettings {
        exploration: 1.0,
        depth_charges: 0,
        threads: 2,
        mode: "independent".into(),
        seed: 7,
        safety_margin_ms: 500,
    };
    let engine = settings.to_engine_config();
    assert!((engine.exploration - 1.0).abs() < f64::EPSILON);
    assert_eq!(engine.depth_charges, 1); // Clamped
    assert_eq!(engine.threads, 2);
    assert_eq!(engine.mode, ParallelMode::IndependentTrees);
    assert_eq!(engine.seed, 7);
    assert_eq!(engine.safety_margin, Duration::from_millis(500));
}

#[test]
fn test_unknown_mode_falls_back_to_shared() {
    let settings = MctsSettings {
        mode: "sideways".into(),
        ..MctsSettings::default()
    };
    assert_eq!(settings.parallel_mode(), ParallelMode::SharedTree);
}

#[test]
fn test_load_from_path_with_bad_toml_uses_defaults() {
    let path = std::env::temp_dir().join(format!("deliberate-bad-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[mcts\nthreads = ").unwrap();
    drop(file);

    let config = load_from_path(&path);
    assert_eq!(config.mcts.threads, CentralConfig::default().mcts.threads);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_load_from_missing_path_uses_defaults() {
    let config = load_from_path(std::path::Path::new("/nonexistent/deliberate.toml"));
    assert_eq!(config.minimax.max_depth, 6);
}

#[test]
fn test_deliberate_env_overrides() {
    std::env::set_var("DELIBERATE_MINIMAX_HEURISTIC_VALUE", "40");
    std::env::set_var("DELIBERATE_MCTS_MODE", "independent");
    std::env::set_var("DELIBERATE_MCTS_EXPLORATION", "0.5");
    std::env::set_var("DELIBERATE_MATCH_O_ENGINE", "random");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.minimax.heuristic_value, 40);
    assert_eq!(config.mcts.mode, "independent");
    assert!((config.mcts.exploration - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.match_settings.o_engine, "random");

    std::env::remove_var("DELIBERATE_MINIMAX_HEURISTIC_VALUE");
    std::env::remove_var("DELIBERATE_MCTS_MODE");
    std::env::remove_var("DELIBERATE_MCTS_EXPLORATION");
    std::env::remove_var("DELIBERATE_MATCH_O_ENGINE");
}

#[test]
fn test_unparseable_env_override_is_ignored() {
    std::env::set_var("DELIBERATE_MCTS_DEPTH_CHARGES", "lots");
    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.mcts.depth_charges, 8);
    std::env::remove_var("DELIBERATE_MCTS_DEPTH_CHARGES");
}

#[test]
fn test_config_clone() {
    let config = CentralConfig::default();
    let cloned = config.clone();
    assert_eq!(config.mcts.mode, cloned.mcts.mode);
    assert_eq!(config.match_settings.x_engine, cloned.match_settings.x_engine);
}
