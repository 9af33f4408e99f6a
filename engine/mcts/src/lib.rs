//! Monte Carlo Tree Search over a transition system.
//!
//! The tree alternates Max nodes (self chooses a move) and Min nodes (self's
//! move is fixed and the other agents reply). Each iteration runs four
//! phases:
//!
//! 1. **Selection**: take the first unvisited node within two levels, else
//!    descend by UCB1, signed by whose turn it is at the parent
//! 2. **Expansion**: add every legal self move below a Max node, and every
//!    distinct outcome of the replies below each new Min node
//! 3. **Simulation**: average several random playouts to a terminal state
//! 4. **Backpropagation**: add the average to every node up to the root
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! use games_tictactoe::{Mark, State, TicTacToe};
//! use mcts::{MctsConfig, MctsTree, ParallelSearch};
//!
//! let config = MctsConfig::for_testing().with_threads(2);
//! let mut tree = MctsTree::new(Arc::new(TicTacToe::new()), Mark::X, State::new(), config);
//!
//! ParallelSearch::run(&mut tree, Instant::now() + Duration::from_millis(50)).unwrap();
//! let action = tree.choose_move().unwrap();
//! println!("X plays {action:?}");
//!
//! // After the real game advances, keep the matching subtree
//! let next = State::new().make_move(4).make_move(0);
//! tree.update_root(&next);
//! ```
//!
//! # Concurrency
//!
//! ```text
//! +---------------------------------------------------------+
//! |                     ParallelSearch                      |
//! |   SharedTree: N workers -> one tree, one permit per      |
//! |               root child                                |
//! |   IndependentTrees: N workers -> N trees -> merge        |
//! +----------------------------+----------------------------+
//!                              |
//!                  +-----------v-----------+      +----------+
//!                  |       MctsTree        |<-----| Watchdog |
//!                  | select -> expand ->   |token +----------+
//!                  | simulate -> backprop  |
//!                  +-----------------------+
//! ```

pub mod config;
pub mod node;
pub mod parallel;
pub mod search;
pub mod tree;

// Re-export main types
pub use config::{MctsConfig, ParallelMode};
pub use node::{MctsNode, NodeKind, NodeStats, Permit};
pub use parallel::ParallelSearch;
pub use search::{Iteration, Locking, SearchStats};
pub use tree::{MctsTree, NodeRef, RootUpdate, TreeStats};
