//! Minimax search over a transition system.
//!
//! Two engines share the same two-ply structure (self maximizes over its own
//! moves, the other agents jointly minimize over the joint moves consistent
//! with that choice):
//!
//! - [`AlphaBeta`]: depth-bounded, optionally time-sliced, with pruning and a
//!   watchdog that stops deepening shortly before the deadline
//! - [`Minimax`]: full-width search, used for small games and as the
//!   reference result alpha-beta must reproduce
//!
//! Nodes cut off above the terminal states are scored by a [`LeafEvaluator`].
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! use games_tictactoe::{Mark, State, TicTacToe};
//! use minimax::{AlphaBeta, AlphaBetaConfig, ConstantHeuristic};
//!
//! let engine = AlphaBeta::new(
//!     Arc::new(TicTacToe::new()),
//!     Mark::X,
//!     ConstantHeuristic::default(),
//!     AlphaBetaConfig::default().with_max_depth(Some(2)).with_safety_margin(Duration::ZERO),
//! );
//! let action = engine
//!     .select_move(&State::new(), Instant::now() + Duration::from_secs(5))
//!     .unwrap();
//! println!("X plays {action:?}");
//! ```

pub mod alphabeta;
pub mod config;
pub mod heuristic;
pub mod minimax;
pub mod report;

// Re-export main types
pub use alphabeta::AlphaBeta;
pub use config::AlphaBetaConfig;
pub use heuristic::{ConstantHeuristic, GoalProximity, LeafEvaluator};
pub use minimax::Minimax;
pub use report::{SearchReport, SearchStats};
