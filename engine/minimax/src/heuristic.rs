//! Leaf evaluators used when a search stops above the terminal states.

use engine_core::{DefinitionError, TransitionSystem};

/// Estimate of a non-terminal state's value for one agent, on the goal scale.
pub trait LeafEvaluator<T: TransitionSystem>: Send + Sync {
    fn evaluate(
        &self,
        system: &T,
        state: &T::State,
        agent: &T::Agent,
    ) -> Result<i32, DefinitionError>;
}

/// Same value for every state. The default of 50 sits midway on the goal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantHeuristic(pub i32);

impl Default for ConstantHeuristic {
    fn default() -> Self {
        Self(50)
    }
}

impl<T: TransitionSystem> LeafEvaluator<T> for ConstantHeuristic {
    fn evaluate(&self, _: &T, _: &T::State, _: &T::Agent) -> Result<i32, DefinitionError> {
        Ok(self.0)
    }
}

/// The agent's goal value in the current state where the game defines one,
/// otherwise `fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalProximity {
    pub fallback: i32,
}

impl Default for GoalProximity {
    fn default() -> Self {
        Self { fallback: 50 }
    }
}

impl<T: TransitionSystem> LeafEvaluator<T> for GoalProximity {
    fn evaluate(
        &self,
        system: &T,
        state: &T::State,
        agent: &T::Agent,
    ) -> Result<i32, DefinitionError> {
        match system.goal(state, agent) {
            Ok(value) => Ok(value),
            Err(DefinitionError::Goal { .. }) => Ok(self.fallback),
            Err(other) => Err(other),
        }
    }
}
