//! Core traits and types shared by the search engines
//!
//! This crate provides the abstractions every engine builds on:
//! - `TransitionSystem`: the game rules as seen by a search (legal moves,
//!   joint moves, successor states, terminal test, goal values)
//! - `Score`: minimax value paired with the action that achieved it
//! - `DefinitionError` / `SearchError`: the caller-visible failure classes
//! - `CancelToken` / `Watchdog`: deadline-driven cooperative cancellation

pub mod cancel;
pub mod error;
pub mod score;
pub mod transition;

// Re-export main types for convenience
pub use cancel::{CancelToken, Watchdog};
pub use error::{DefinitionError, SearchError};
pub use score::Score;
pub use transition::{DepthCharge, JointMove, TransitionSystem};
