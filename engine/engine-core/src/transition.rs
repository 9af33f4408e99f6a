//! Transition-system abstraction consumed by the search engines.
//!
//! A transition system describes a deterministic, perfect-information game
//! played by a fixed set of agents that move simultaneously. Turn-taking games
//! are expressed by giving the idle agents a single `noop` move.
//!
//! The search engines never mutate states or moves; they only ask the
//! transition system for legal moves, successor states, terminality and goal
//! values. Implementations are expected to be pure: the same query must always
//! produce the same answer.

use std::fmt::Debug;
use std::hash::Hash;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::DefinitionError;

/// One move per agent, ordered the way [`TransitionSystem::agents`] orders agents.
pub type JointMove<M> = Vec<M>;

/// Outcome of a single random playout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthCharge {
    /// Goal value of the terminal state for the requested agent
    pub goal: i32,
    /// Number of joint moves applied before reaching the terminal state
    pub depth: u32,
}

/// Game rules as seen by the search engines.
///
/// # Example
///
/// ```rust
/// use engine_core::{DefinitionError, JointMove, TransitionSystem};
///
/// /// Single-agent counter: add 1 or 2 until reaching at least 3.
/// #[derive(Debug)]
/// struct Counter;
///
/// impl TransitionSystem for Counter {
///     type State = u8;
///     type Move = u8;
///     type Agent = &'static str;
///
///     fn agents(&self) -> Vec<Self::Agent> {
///         vec!["solo"]
///     }
///
///     fn legal_moves(&self, _state: &u8, _agent: &Self::Agent) -> Result<Vec<u8>, DefinitionError> {
///         Ok(vec![1, 2])
///     }
///
///     fn legal_joint_moves(
///         &self,
///         _state: &u8,
///         _agent: &Self::Agent,
///         action: &u8,
///     ) -> Result<Vec<JointMove<u8>>, DefinitionError> {
///         Ok(vec![vec![*action]])
///     }
///
///     fn next_state(&self, state: &u8, joint: &[u8]) -> Result<u8, DefinitionError> {
///         Ok(state + joint[0])
///     }
///
///     fn is_terminal(&self, state: &u8) -> bool {
///         *state >= 3
///     }
///
///     fn goal(&self, state: &u8, _agent: &Self::Agent) -> Result<i32, DefinitionError> {
///         Ok(if *state == 3 { 100 } else { 0 })
///     }
/// }
///
/// assert_eq!(Counter.next_state(&1, &[2]).unwrap(), 3);
/// assert!(Counter.is_terminal(&3));
/// ```
pub trait TransitionSystem: Send + Sync {
    /// Immutable game state, compared by value
    type State: Clone + Eq + Hash + Debug + Send + Sync;

    /// Action identifier for a single agent
    type Move: Clone + Eq + Hash + Debug + Send + Sync;

    /// Agent (role) identifier
    type Agent: Clone + Eq + Hash + Debug + Send + Sync;

    /// All agents, in joint-move order.
    fn agents(&self) -> Vec<Self::Agent>;

    /// Legal moves for `agent` in `state`, in a stable enumeration order.
    fn legal_moves(
        &self,
        state: &Self::State,
        agent: &Self::Agent,
    ) -> Result<Vec<Self::Move>, DefinitionError>;

    /// Every joint move in which `agent` plays `action` while the other agents
    /// vary over their legal moves.
    ///
    /// The result is treated as opaque: callers iterate it as returned and never
    /// rebuild it from per-agent legal moves, since the rules may constrain
    /// combinations.
    fn legal_joint_moves(
        &self,
        state: &Self::State,
        agent: &Self::Agent,
        action: &Self::Move,
    ) -> Result<Vec<JointMove<Self::Move>>, DefinitionError>;

    /// Successor of `state` after every agent plays its entry of `joint`.
    fn next_state(
        &self,
        state: &Self::State,
        joint: &[Self::Move],
    ) -> Result<Self::State, DefinitionError>;

    /// Whether the game is over in `state`.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Goal value of `state` for `agent`, on the 0-100 scale.
    fn goal(&self, state: &Self::State, agent: &Self::Agent) -> Result<i32, DefinitionError>;

    /// Uniformly random legal joint move: one random legal move per agent.
    fn random_joint_move<R: Rng + ?Sized>(
        &self,
        state: &Self::State,
        rng: &mut R,
    ) -> Result<JointMove<Self::Move>, DefinitionError>
    where
        Self: Sized,
    {
        let mut joint = Vec::new();
        for agent in self.agents() {
            let moves = self.legal_moves(state, &agent)?;
            let choice = moves
                .choose(rng)
                .ok_or_else(|| DefinitionError::NoLegalMoves {
                    state: format!("{state:?}"),
                    agent: format!("{agent:?}"),
                })?;
            joint.push(choice.clone());
        }
        Ok(joint)
    }

    /// Random playout ("depth charge") from `state` to a terminal state.
    fn depth_charge<R: Rng + ?Sized>(
        &self,
        state: &Self::State,
        agent: &Self::Agent,
        rng: &mut R,
    ) -> Result<DepthCharge, DefinitionError>
    where
        Self: Sized,
    {
        let mut current = state.clone();
        let mut depth = 0;
        while !self.is_terminal(&current) {
            let joint = self.random_joint_move(&current, rng)?;
            current = self.next_state(&current, &joint)?;
            depth += 1;
        }
        Ok(DepthCharge {
            goal: self.goal(&current, agent)?,
            depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// Two agents pick a number each turn; the game ends once the sum reaches 4.
    #[derive(Debug)]
    struct Race;

    impl TransitionSystem for Race {
        type State = u32;
        type Move = u32;
        type Agent = u8;

        fn agents(&self) -> Vec<u8> {
            vec![0, 1]
        }

        fn legal_moves(&self, state: &u32, _agent: &u8) -> Result<Vec<u32>, DefinitionError> {
            if self.is_terminal(state) {
                return Ok(Vec::new());
            }
            Ok(vec![0, 1])
        }

        fn legal_joint_moves(
            &self,
            state: &u32,
            agent: &u8,
            action: &u32,
        ) -> Result<Vec<JointMove<u32>>, DefinitionError> {
            let others = self.legal_moves(state, &(1 - agent))?;
            Ok(others
                .into_iter()
                .map(|other| {
                    if *agent == 0 {
                        vec![*action, other]
                    } else {
                        vec![other, *action]
                    }
                })
                .collect())
        }

        fn next_state(&self, state: &u32, joint: &[u32]) -> Result<u32, DefinitionError> {
            // Always advance by at least one so playouts terminate
            Ok(state + joint.iter().sum::<u32>().max(1))
        }

        fn is_terminal(&self, state: &u32) -> bool {
            *state >= 4
        }

        fn goal(&self, state: &u32, agent: &u8) -> Result<i32, DefinitionError> {
            if !self.is_terminal(state) {
                return Err(DefinitionError::Goal {
                    state: state.to_string(),
                    agent: agent.to_string(),
                });
            }
            Ok(if *state == 4 { 100 } else { 0 })
        }
    }

    #[test]
    fn test_random_joint_move_has_one_move_per_agent() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..20 {
            let joint = Race.random_joint_move(&0, &mut rng).unwrap();
            assert_eq!(joint.len(), 2);
            assert!(joint.iter().all(|m| *m <= 1));
        }
    }

    #[test]
    fn test_random_joint_move_without_legal_moves_fails() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let err = Race.random_joint_move(&9, &mut rng).unwrap_err();
        assert!(matches!(err, DefinitionError::NoLegalMoves { .. }));
    }

    #[test]
    fn test_depth_charge_reaches_terminal() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        for _ in 0..50 {
            let charge = Race.depth_charge(&0, &0, &mut rng).unwrap();
            assert!(charge.goal == 0 || charge.goal == 100);
            assert!(charge.depth >= 2 && charge.depth <= 4);
        }
    }

    #[test]
    fn test_depth_charge_from_terminal_is_immediate() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let charge = Race.depth_charge(&4, &1, &mut rng).unwrap();
        assert_eq!(charge, DepthCharge { goal: 100, depth: 0 });
    }
}
