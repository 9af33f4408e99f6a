//! TicTacToe expressed as a two-agent transition system
//!
//! This crate is the reference game for the search engines. Turns alternate,
//! which the simultaneous-move model expresses by giving the idle agent a
//! single `Noop` move: every joint move pairs one `Place` with one `Noop`.
//!
//! Goal values follow the usual 0-100 scale: 100 for a win, 50 for a draw and
//! 0 for a loss.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::TransitionSystem;
//! use games_tictactoe::{Action, Mark, State, TicTacToe};
//!
//! let game = TicTacToe::new();
//! let state = State::new();
//!
//! let moves = game.legal_moves(&state, &Mark::X).unwrap();
//! assert_eq!(moves.len(), 9);
//! assert_eq!(game.legal_moves(&state, &Mark::O).unwrap(), vec![Action::Noop]);
//!
//! let next = game.next_state(&state, &[Action::Place(4), Action::Noop]).unwrap();
//! assert_eq!(next.current_player(), Mark::O);
//! ```

use engine_core::{DefinitionError, JointMove, TransitionSystem};

pub const WIN: i32 = 100;
pub const DRAW: i32 = 50;
pub const LOSS: i32 = 0;

/// One of the two agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Position of this agent in joint moves
    pub fn index(self) -> usize {
        match self {
            Mark::X => 0,
            Mark::O => 1,
        }
    }
}

/// TicTacToe game state
///
/// Represents the complete state of a TicTacToe game including the board,
/// current player, and winner information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    /// Board representation: 0=empty, 1=X, 2=O
    board: [u8; 9],
    /// Current player: 1=X, 2=O
    current_player: u8,
    /// Winner: 0=none/ongoing, 1=X, 2=O, 3=draw
    winner: u8,
}

impl State {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [0; 9],
            current_player: 1, // X goes first
            winner: 0,
        }
    }

    /// Build a state from a board, deriving the player to move and the winner.
    ///
    /// `X` moves whenever both marks have been placed equally often.
    pub fn from_board(board: [u8; 9]) -> Self {
        let xs = board.iter().filter(|&&c| c == 1).count();
        let os = board.iter().filter(|&&c| c == 2).count();
        Self {
            board,
            current_player: if xs > os { 2 } else { 1 },
            winner: Self::check_winner(&board),
        }
    }

    /// Check if the game is over
    pub fn is_done(&self) -> bool {
        self.winner != 0
    }

    pub fn current_player(&self) -> Mark {
        if self.current_player == 1 {
            Mark::X
        } else {
            Mark::O
        }
    }

    /// Winning mark, if any. `None` for ongoing games and draws.
    pub fn winner(&self) -> Option<Mark> {
        match self.winner {
            1 => Some(Mark::X),
            2 => Some(Mark::O),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.winner == 3
    }

    /// Empty positions, or nothing once the game is over
    pub fn open_positions(&self) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }

        (0..9u8)
            .filter(|&pos| self.board[pos as usize] == 0)
            .collect()
    }

    /// Make a move and return the new state
    pub fn make_move(&self, position: u8) -> State {
        if self.is_done() || position >= 9 || self.board[position as usize] != 0 {
            return *self; // Invalid move, return unchanged state
        }

        let mut new_state = *self;
        new_state.board[position as usize] = self.current_player;

        // Check for winner
        new_state.winner = Self::check_winner(&new_state.board);

        // Switch player if game not over
        if new_state.winner == 0 {
            new_state.current_player = if self.current_player == 1 { 2 } else { 1 };
        }

        new_state
    }

    /// Check for winner on the board
    fn check_winner(board: &[u8; 9]) -> u8 {
        // Winning positions (rows, columns, diagonals)
        const LINES: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8], // rows
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8], // columns
            [0, 4, 8],
            [2, 4, 6], // diagonals
        ];

        for line in &LINES {
            let [a, b, c] = *line;
            if board[a] != 0 && board[a] == board[b] && board[b] == board[c] {
                return board[a]; // Return the winning player
            }
        }

        // Check for draw (board full but no winner)
        if board.iter().all(|&cell| cell != 0) {
            return 3; // Draw
        }

        0 // Game ongoing
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// TicTacToe move for one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Place a piece at the given position (0-8)
    Place(u8),
    /// Pass while the other agent moves
    Noop,
}

/// TicTacToe rules
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToe;

impl TicTacToe {
    pub fn new() -> Self {
        Self
    }

    /// Goal value of a finished game for `mark`
    fn outcome(state: &State, mark: Mark) -> i32 {
        match state.winner() {
            Some(winner) if winner == mark => WIN,
            Some(_) => LOSS,
            None => DRAW,
        }
    }
}

impl TransitionSystem for TicTacToe {
    type State = State;
    type Move = Action;
    type Agent = Mark;

    fn agents(&self) -> Vec<Mark> {
        vec![Mark::X, Mark::O]
    }

    fn legal_moves(&self, state: &State, agent: &Mark) -> Result<Vec<Action>, DefinitionError> {
        if state.is_done() {
            return Ok(Vec::new());
        }
        if state.current_player() == *agent {
            Ok(state.open_positions().into_iter().map(Action::Place).collect())
        } else {
            Ok(vec![Action::Noop])
        }
    }

    fn legal_joint_moves(
        &self,
        state: &State,
        agent: &Mark,
        action: &Action,
    ) -> Result<Vec<JointMove<Action>>, DefinitionError> {
        let other = agent.opponent();
        let others = self.legal_moves(state, &other)?;
        Ok(others
            .into_iter()
            .map(|theirs| {
                let mut joint = vec![Action::Noop; 2];
                joint[agent.index()] = *action;
                joint[other.index()] = theirs;
                joint
            })
            .collect())
    }

    fn next_state(&self, state: &State, joint: &[Action]) -> Result<State, DefinitionError> {
        if joint.len() != 2 {
            return Err(DefinitionError::Move(format!(
                "Expected 2 moves in joint move, got {}",
                joint.len()
            )));
        }
        if state.is_done() {
            return Err(DefinitionError::Transition(format!(
                "No successor for finished game {:?}",
                state.board
            )));
        }

        let mover = state.current_player();
        let idle = joint[mover.opponent().index()];
        if idle != Action::Noop {
            return Err(DefinitionError::Move(format!(
                "{:?} must play Noop while {:?} moves, got {:?}",
                mover.opponent(),
                mover,
                idle
            )));
        }

        match joint[mover.index()] {
            Action::Place(pos) if pos < 9 && state.board[pos as usize] == 0 => {
                Ok(state.make_move(pos))
            }
            other => Err(DefinitionError::Move(format!(
                "Illegal move {:?} for {:?} on board {:?}",
                other, mover, state.board
            ))),
        }
    }

    fn is_terminal(&self, state: &State) -> bool {
        state.is_done()
    }

    fn goal(&self, state: &State, agent: &Mark) -> Result<i32, DefinitionError> {
        if !state.is_done() {
            return Err(DefinitionError::Goal {
                state: format!("{:?}", state.board),
                agent: format!("{agent:?}"),
            });
        }
        Ok(Self::outcome(state, *agent))
    }
}
