//! MCTS configuration parameters.

use std::time::Duration;

/// How the concurrent driver shares work between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallelMode {
    /// All workers iterate on one tree. Each child of the root carries a
    /// permit that a worker must hold while it works below that child.
    #[default]
    SharedTree,
    /// Each worker grows a private tree from the root state; the trees are
    /// merged into the caller's tree once the deadline passes.
    IndependentTrees,
}

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Exploration constant `c` in `polarity * mean + sqrt(c * ln(N) / n)`.
    /// 2.0 gives the textbook UCB1 bonus `sqrt(2 ln N / n)`.
    pub exploration: f64,

    /// Random playouts averaged per simulation.
    pub depth_charges: u32,

    /// Worker threads used by the concurrent driver.
    pub threads: usize,

    /// Concurrency strategy of the concurrent driver.
    pub mode: ParallelMode,

    /// Seed for playout randomness. Worker `i` uses `seed + i`.
    pub seed: u64,

    /// How long before the hard deadline the search is stopped.
    pub safety_margin: Duration,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration: 2.0,
            depth_charges: 8,
            threads: 4,
            mode: ParallelMode::SharedTree,
            seed: 0,
            safety_margin: Duration::from_secs(4),
        }
    }
}

impl MctsConfig {
    /// Create a fast, single-threaded config for testing.
    pub fn for_testing() -> Self {
        Self {
            exploration: 2.0,
            depth_charges: 2,
            threads: 1,
            mode: ParallelMode::SharedTree,
            seed: 42,
            safety_margin: Duration::ZERO,
        }
    }

    /// Builder pattern: set the exploration constant.
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    /// Builder pattern: set playouts per simulation (at least one).
    pub fn with_depth_charges(mut self, n: u32) -> Self {
        self.depth_charges = n.max(1);
        self
    }

    /// Builder pattern: set worker threads (at least one).
    pub fn with_threads(mut self, n: usize) -> Self {
        self.threads = n.max(1);
        self
    }

    /// Builder pattern: set the concurrency strategy.
    pub fn with_mode(mut self, mode: ParallelMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder pattern: set the playout seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder pattern: set the safety margin.
    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.depth_charges, 8);
        assert_eq!(config.threads, 4);
        assert_eq!(config.mode, ParallelMode::SharedTree);
        assert_eq!(config.safety_margin, Duration::from_secs(4));
        assert!((config.exploration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_depth_charges(3)
            .with_threads(2)
            .with_mode(ParallelMode::IndependentTrees)
            .with_seed(9);

        assert_eq!(config.depth_charges, 3);
        assert_eq!(config.threads, 2);
        assert_eq!(config.mode, ParallelMode::IndependentTrees);
        assert_eq!(config.seed, 9);
    }

    #[test]
    fn test_builder_clamps_counts() {
        let config = MctsConfig::default().with_depth_charges(0).with_threads(0);
        assert_eq!(config.depth_charges, 1);
        assert_eq!(config.threads, 1);
    }
}
