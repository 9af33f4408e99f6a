//! Search results shared by the minimax engines.

use engine_core::Score;

/// Counters collected during one search call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Max and min nodes entered
    pub nodes: u64,
    /// Terminal states scored with their goal value
    pub terminal_evaluations: u64,
    /// Non-terminal states scored by the leaf evaluator
    pub heuristic_evaluations: u64,
    /// Sibling loops abandoned because `beta <= alpha`
    pub cutoffs: u64,
}

/// Depth-0 score plus the counters of the search that produced it.
#[derive(Debug, Clone)]
pub struct SearchReport<M> {
    /// Best score at the root; `action` is absent only for a terminal root.
    pub score: Score<M>,
    pub stats: SearchStats,
}
