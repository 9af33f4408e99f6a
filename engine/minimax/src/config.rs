//! Alpha-beta configuration parameters.

use std::time::Duration;

/// Configuration for the alpha-beta engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaBetaConfig {
    /// Number of self turns searched below the root before falling back to the
    /// leaf evaluator. `None` searches to terminal states.
    pub max_depth: Option<u32>,

    /// Divide the remaining time evenly across sibling moves and force a leaf
    /// evaluation wherever a branch runs out of its share.
    pub time_sliced: bool,

    /// How long before the hard deadline the watchdog stops the search.
    pub safety_margin: Duration,
}

impl Default for AlphaBetaConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(6),
            time_sliced: true,
            safety_margin: Duration::from_secs(3),
        }
    }
}

impl AlphaBetaConfig {
    /// Exhaustive search with no time pressure, for small test games.
    pub fn for_testing() -> Self {
        Self {
            max_depth: None,
            time_sliced: false,
            safety_margin: Duration::ZERO,
        }
    }

    /// Builder pattern: set the depth bound (`None` for unbounded).
    pub fn with_max_depth(mut self, depth: Option<u32>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder pattern: enable or disable time slicing.
    pub fn with_time_slicing(mut self, enabled: bool) -> Self {
        self.time_sliced = enabled;
        self
    }

    /// Builder pattern: set the watchdog safety margin.
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
        let config = AlphaBetaConfig::default();
        assert_eq!(config.max_depth, Some(6));
        assert!(config.time_sliced);
        assert_eq!(config.safety_margin, Duration::from_secs(3));
    }

    #[test]
    fn test_builder_pattern() {
        let config = AlphaBetaConfig::default()
            .with_max_depth(None)
            .with_time_slicing(false)
            .with_safety_margin(Duration::from_millis(500));

        assert_eq!(config.max_depth, None);
        assert!(!config.time_sliced);
        assert_eq!(config.safety_margin, Duration::from_millis(500));
    }
}
