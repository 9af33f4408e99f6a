//! Error taxonomy shared by the search engines.
//!
//! Only malformed game definitions surface to callers. Running out of time,
//! missing a reusable subtree and losing a lock race are all handled inside
//! the engines and never produce an error.

use thiserror::Error;

/// The game definition cannot answer a query it is required to answer.
///
/// States and agents are carried in their `Debug` rendering so the error stays
/// independent of the concrete transition system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Goal undefined for agent {agent} in state {state}")]
    Goal { state: String, agent: String },

    #[error("Move definition error: {0}")]
    Move(String),

    #[error("Transition definition error: {0}")]
    Transition(String),

    #[error("No legal moves for agent {agent} in non-terminal state {state}")]
    NoLegalMoves { state: String, agent: String },

    #[error("No joint moves for action {action} in state {state}")]
    NoJointMoves { state: String, action: String },
}

/// Errors returned by the move-selection entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Cannot select a move from a terminal state")]
    TerminalRoot,
}
