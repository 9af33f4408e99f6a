//! Table-driven transition system
//!
//! A [`TableGame`] spells out its rules explicitly: every joint move available
//! in a state together with the state it leads to, plus goal values for the
//! states where they are defined. Legal moves are whatever the table mentions,
//! so constrained joint-move sets (not a full cross-product of per-agent
//! moves) can be expressed directly.
//!
//! Tables are small and hand-written for scenarios, or generated with
//! [`TableGame::random_tree`] for property tests and benchmarks.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::TransitionSystem;
//! use games_table::TableGame;
//!
//! let game = TableGame::builder(["self", "other"])
//!     .transition("root", ["a", "noop"], "won")
//!     .transition("root", ["b", "noop"], "lost")
//!     .terminal("won", [100, 0])
//!     .terminal("lost", [0, 100])
//!     .build()
//!     .unwrap();
//!
//! let root = game.initial_state();
//! assert_eq!(game.legal_moves(&root, &"self".to_string()).unwrap(), ["a", "b"]);
//! ```

use std::collections::{HashMap, HashSet};

use engine_core::{DefinitionError, JointMove, TransitionSystem};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

/// Problems found while assembling a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("A table game needs at least one agent")]
    NoAgents,

    #[error("No initial state: set one or add a transition")]
    NoInitialState,

    #[error("Joint move {joint:?} from {from} has {actual} entries, expected {expected}")]
    JointArity {
        from: String,
        joint: Vec<String>,
        expected: usize,
        actual: usize,
    },

    #[error("Joint move {joint:?} from {from} is listed twice")]
    DuplicateTransition { from: String, joint: Vec<String> },

    #[error("Goal values for {state} have {actual} entries, expected {expected}")]
    GoalArity {
        state: String,
        expected: usize,
        actual: usize,
    },

    #[error("Terminal state {0} has outgoing transitions")]
    TerminalWithMoves(String),
}

/// Explicit game table. States, moves and agents are plain strings.
#[derive(Debug, Clone)]
pub struct TableGame {
    agents: Vec<String>,
    initial: String,
    transitions: HashMap<String, Vec<(JointMove<String>, String)>>,
    goals: HashMap<String, Vec<i32>>,
    terminals: HashSet<String>,
}

impl TableGame {
    pub fn builder<I, S>(agents: I) -> TableGameBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TableGameBuilder {
            agents: agents.into_iter().map(Into::into).collect(),
            initial: None,
            transitions: Vec::new(),
            goals: Vec::new(),
            terminals: Vec::new(),
        }
    }

    /// Generate a uniform game tree.
    ///
    /// Every agent has `branching` moves (`m0`, `m1`, ...) in every
    /// non-terminal state, all combinations are legal, and every joint move
    /// leads to a fresh state. Leaves sit at `depth` joint moves below the
    /// root. The first agent's leaf goals are drawn uniformly from 0-100 and
    /// every other agent gets the complement, so the game is constant-sum.
    pub fn random_tree(seed: u64, agents: usize, branching: usize, depth: u32) -> TableGame {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let names: Vec<String> = (0..agents.max(1)).map(|i| format!("agent{i}")).collect();
        let moves: Vec<String> = (0..branching.max(1)).map(|i| format!("m{i}")).collect();
        let joints = cross_product(names.len(), &moves);

        let mut game = TableGame {
            agents: names,
            initial: "r".to_string(),
            transitions: HashMap::new(),
            goals: HashMap::new(),
            terminals: HashSet::new(),
        };

        let mut frontier = vec![game.initial.clone()];
        for _ in 0..depth {
            let mut next = Vec::with_capacity(frontier.len() * joints.len());
            for state in frontier {
                let edges: Vec<_> = joints
                    .iter()
                    .enumerate()
                    .map(|(i, joint)| (joint.clone(), format!("{state}.{i}")))
                    .collect();
                next.extend(edges.iter().map(|(_, to)| to.clone()));
                game.transitions.insert(state, edges);
            }
            frontier = next;
        }

        for leaf in frontier {
            let first: i32 = rng.gen_range(0..=100);
            let mut goals = vec![100 - first; game.agents.len()];
            goals[0] = first;
            game.goals.insert(leaf.clone(), goals);
            game.terminals.insert(leaf);
        }
        game
    }

    pub fn initial_state(&self) -> String {
        self.initial.clone()
    }

    /// Terminal states, in no particular order.
    pub fn terminal_states(&self) -> impl Iterator<Item = &String> {
        self.terminals.iter()
    }

    /// Joint moves listed for `state`, in table order.
    pub fn joint_moves(&self, state: &str) -> impl Iterator<Item = &JointMove<String>> {
        self.transitions
            .get(state)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(joint, _)| joint))
    }

    fn agent_index(&self, agent: &str) -> Result<usize, DefinitionError> {
        self.agents
            .iter()
            .position(|a| a == agent)
            .ok_or_else(|| DefinitionError::Move(format!("Unknown agent {agent}")))
    }
}

impl TransitionSystem for TableGame {
    type State = String;
    type Move = String;
    type Agent = String;

    fn agents(&self) -> Vec<String> {
        self.agents.clone()
    }

    fn legal_moves(&self, state: &String, agent: &String) -> Result<Vec<String>, DefinitionError> {
        let idx = self.agent_index(agent)?;
        let mut moves: Vec<String> = Vec::new();
        for joint in self.joint_moves(state) {
            if !moves.contains(&joint[idx]) {
                moves.push(joint[idx].clone());
            }
        }
        Ok(moves)
    }

    fn legal_joint_moves(
        &self,
        state: &String,
        agent: &String,
        action: &String,
    ) -> Result<Vec<JointMove<String>>, DefinitionError> {
        let idx = self.agent_index(agent)?;
        Ok(self
            .joint_moves(state)
            .filter(|joint| joint[idx] == *action)
            .cloned()
            .collect())
    }

    fn next_state(&self, state: &String, joint: &[String]) -> Result<String, DefinitionError> {
        self.transitions
            .get(state)
            .and_then(|edges| edges.iter().find(|(j, _)| j.as_slice() == joint))
            .map(|(_, to)| to.clone())
            .ok_or_else(|| {
                DefinitionError::Transition(format!("No transition from {state} for {joint:?}"))
            })
    }

    fn is_terminal(&self, state: &String) -> bool {
        self.terminals.contains(state)
    }

    fn goal(&self, state: &String, agent: &String) -> Result<i32, DefinitionError> {
        let idx = self.agent_index(agent)?;
        self.goals
            .get(state)
            .map(|goals| goals[idx])
            .ok_or_else(|| DefinitionError::Goal {
                state: state.clone(),
                agent: agent.clone(),
            })
    }

    /// Uniform over the joint moves the table lists, which need not be a
    /// full cross-product of per-agent moves.
    fn random_joint_move<R: Rng + ?Sized>(
        &self,
        state: &String,
        rng: &mut R,
    ) -> Result<JointMove<String>, DefinitionError> {
        self.transitions
            .get(state)
            .and_then(|edges| edges.choose(rng))
            .map(|(joint, _)| joint.clone())
            .ok_or_else(|| DefinitionError::NoLegalMoves {
                state: state.clone(),
                agent: self.agents.join(","),
            })
    }
}

/// Builder for [`TableGame`].
#[derive(Debug, Clone)]
pub struct TableGameBuilder {
    agents: Vec<String>,
    initial: Option<String>,
    transitions: Vec<(String, Vec<String>, String)>,
    goals: Vec<(String, Vec<i32>)>,
    terminals: Vec<String>,
}

impl TableGameBuilder {
    /// Set the initial state. Defaults to the source of the first transition.
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Add the joint move `joint` (one entry per agent) from `from` to `to`.
    pub fn transition<J, S>(mut self, from: impl Into<String>, joint: J, to: impl Into<String>) -> Self
    where
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transitions.push((
            from.into(),
            joint.into_iter().map(Into::into).collect(),
            to.into(),
        ));
        self
    }

    /// Mark `state` terminal with one goal value per agent.
    pub fn terminal(mut self, state: impl Into<String>, goals: impl IntoIterator<Item = i32>) -> Self {
        let state = state.into();
        self.terminals.push(state.clone());
        self.goals.push((state, goals.into_iter().collect()));
        self
    }

    /// Goal values for a non-terminal state.
    pub fn goals(mut self, state: impl Into<String>, goals: impl IntoIterator<Item = i32>) -> Self {
        self.goals.push((state.into(), goals.into_iter().collect()));
        self
    }

    pub fn build(self) -> Result<TableGame, TableError> {
        let expected = self.agents.len();
        if expected == 0 {
            return Err(TableError::NoAgents);
        }

        let initial = self
            .initial
            .or_else(|| self.transitions.first().map(|(from, _, _)| from.clone()))
            .ok_or(TableError::NoInitialState)?;

        let mut transitions: HashMap<String, Vec<(JointMove<String>, String)>> = HashMap::new();
        for (from, joint, to) in self.transitions {
            if joint.len() != expected {
                return Err(TableError::JointArity {
                    from,
                    actual: joint.len(),
                    joint,
                    expected,
                });
            }
            let edges = transitions.entry(from.clone()).or_default();
            if edges.iter().any(|(j, _)| *j == joint) {
                return Err(TableError::DuplicateTransition { from, joint });
            }
            edges.push((joint, to));
        }

        let mut goals = HashMap::new();
        for (state, values) in self.goals {
            if values.len() != expected {
                return Err(TableError::GoalArity {
                    state,
                    expected,
                    actual: values.len(),
                });
            }
            goals.insert(state, values);
        }

        let terminals: HashSet<String> = self.terminals.into_iter().collect();
        if let Some(state) = terminals.iter().find(|s| transitions.contains_key(*s)) {
            return Err(TableError::TerminalWithMoves(state.clone()));
        }

        Ok(TableGame {
            agents: self.agents,
            initial,
            transitions,
            goals,
            terminals,
        })
    }
}

/// Every combination of `moves` across `agents` positions, first agent slowest.
fn cross_product(agents: usize, moves: &[String]) -> Vec<JointMove<String>> {
    let mut joints: Vec<JointMove<String>> = vec![Vec::new()];
    for _ in 0..agents {
        joints = joints
            .into_iter()
            .flat_map(|prefix| {
                moves.iter().map(move |m| {
                    let mut joint = prefix.clone();
                    joint.push(m.clone());
                    joint
                })
            })
            .collect();
    }
    joints
}

#[cfg(test)]
mod tests;
