//! Minimax result values.

use std::cmp::Ordering;

/// Immutable pairing of a value with the action that achieved it.
///
/// Leaf evaluations carry no action; scores propagated up through a min layer
/// are tagged with the self-move being evaluated. Comparison looks at `value`
/// only, so two scores with different actions but equal values are equal.
#[derive(Debug, Clone)]
pub struct Score<M> {
    pub value: i32,
    pub action: Option<M>,
}

impl<M> Score<M> {
    /// Seed for a maximizing scan.
    pub const MIN: i32 = i32::MIN;

    /// Seed for a minimizing scan.
    pub const MAX: i32 = i32::MAX;

    /// Score of a leaf or terminal evaluation.
    pub fn leaf(value: i32) -> Self {
        Self {
            value,
            action: None,
        }
    }

    pub fn with_action(value: i32, action: M) -> Self {
        Self {
            value,
            action: Some(action),
        }
    }

    /// Re-tag this score with `action`, keeping its value.
    pub fn tagged(self, action: M) -> Self {
        Self::with_action(self.value, action)
    }

    /// The larger of `self` (best so far) and `candidate`; ties keep `self`.
    pub fn better_of(self, candidate: Self) -> Self {
        if candidate.value > self.value {
            candidate
        } else {
            self
        }
    }

    /// The smaller of `self` (best so far) and `candidate`; ties keep `self`.
    pub fn worse_of(self, candidate: Self) -> Self {
        if candidate.value < self.value {
            candidate
        } else {
            self
        }
    }
}

impl<M> PartialEq for Score<M> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<M> Eq for Score<M> {}

impl<M> PartialOrd for Score<M> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<M> Ord for Score<M> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_ignores_action() {
        let a = Score::with_action(40, 'a');
        let b = Score::with_action(40, 'b');
        assert_eq!(a, b);
        assert!(Score::<char>::leaf(41) > a);
    }

    #[test]
    fn test_better_of_keeps_first_on_tie() {
        let first = Score::with_action(10, 'a');
        let best = first.better_of(Score::with_action(10, 'b'));
        assert_eq!(best.action, Some('a'));

        let best = best.better_of(Score::with_action(11, 'c'));
        assert_eq!(best.action, Some('c'));
    }

    #[test]
    fn test_worse_of_keeps_smaller() {
        let seed = Score::<char>::leaf(Score::<char>::MAX);
        let worst = seed
            .worse_of(Score::leaf(70))
            .worse_of(Score::leaf(20))
            .worse_of(Score::leaf(20));
        assert_eq!(worst.value, 20);
    }

    #[test]
    fn test_tagged_replaces_action() {
        let leaf = Score::<char>::leaf(55).tagged('x');
        assert_eq!(leaf.value, 55);
        assert_eq!(leaf.action, Some('x'));
    }
}
