use crate::error::GameError;
use itertools::Itertools;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_SIZE: usize = 9;

/// Every line that wins the game, as flat cell indices.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Mark {
    #[default]
    Empty = 0,
    Cross = 1,
    Nought = -1,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Self::Cross => Mark::Nought,
            Self::Nought => Mark::Cross,
            Self::Empty => Mark::Empty,
        }
    }
    pub fn as_char(self) -> char {
        match self {
            Self::Cross => 'X',
            Self::Nought => 'O',
            Self::Empty => '.',
        }
    }
    pub fn value(self) -> i8 {
        self as i8
    }
    pub fn is_player(self) -> bool {
        self != Self::Empty
    }
}

impl TryFrom<i8> for Mark {
    type Error = GameError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mark::Empty),
            1 => Ok(Mark::Cross),
            -1 => Ok(Mark::Nought),
            other => Err(GameError::InvalidCell(other)),
        }
    }
}

/// Hashable snapshot of the nine cells, used to index the Q-table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StateKey([i8; BOARD_SIZE]);

impl StateKey {
    pub fn cells(&self) -> &[i8; BOARD_SIZE] {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &cell in self.0.iter() {
            let mark = Mark::try_from(cell).map_err(|_| fmt::Error)?;
            write!(f, "{}", mark.as_char())?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum IsGameOver {
    InPlay,
    Drawn,
    Win(Mark),
}

/// Extra detail about how a move ended.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum MoveInfo {
    None,
    Winner(Mark),
    Draw,
    Invalid,
}

/// Everything `GameState::apply_move` reports back to the mover.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct MoveOutcome {
    pub state: StateKey,
    pub reward: f64,
    pub done: bool,
    pub info: MoveInfo,
}

/// The 3x3 grid. Cell `i` lives at row `i / 3`, column `i % 3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Array2<Mark>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

fn position(index: usize) -> [usize; 2] {
    [index / 3, index % 3]
}

impl Board {
    pub fn new() -> Self {
        Board {
            cells: Array::from_elem((3, 3), Mark::Empty),
        }
    }

    pub fn from_cells(cells: [i8; BOARD_SIZE]) -> Result<Self, GameError> {
        let mut board = Board::new();
        for (index, &value) in cells.iter().enumerate() {
            board.cells[position(index)] = Mark::try_from(value)?;
        }
        Ok(board)
    }

    pub fn get(&self, index: usize) -> Option<Mark> {
        if index < BOARD_SIZE {
            Some(self.cells[position(index)])
        } else {
            None
        }
    }

    fn set(&mut self, index: usize, mark: Mark) {
        self.cells[position(index)] = mark;
    }

    /// Read-only view of the 3x3 grid.
    pub fn grid(&self) -> ArrayView2<'_, Mark> {
        self.cells.view()
    }

    pub fn to_state_key(&self) -> StateKey {
        let mut key = [0_i8; BOARD_SIZE];
        for (slot, mark) in key.iter_mut().zip(self.cells.iter()) {
            *slot = mark.value();
        }
        StateKey(key)
    }

    pub fn available_moves(&self) -> Vec<usize> {
        self.cells
            .indexed_iter()
            .filter(|(_index, &value)| value == Mark::Empty)
            .map(|((row, col), _)| row * 3 + col)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&value| value != Mark::Empty)
    }

    pub fn winning_line(&self, mark: Mark) -> Option<[usize; 3]> {
        if !mark.is_player() {
            return None;
        }
        WIN_LINES
            .iter()
            .find(|line| line.iter().all(|&index| self.cells[position(index)] == mark))
            .copied()
    }

    pub fn holds_line(&self, mark: Mark) -> bool {
        self.winning_line(mark).is_some()
    }

    pub fn render(&self) -> String {
        self.cells
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|mark| mark.as_char()).join(" "))
            .join("\n")
    }
}

/// A game in progress: the board plus its terminal status.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    board: Board,
    done: bool,
    winner: Mark,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            board: Board::new(),
            done: false,
            winner: Mark::Empty,
        }
    }

    /// Builds a state from an arbitrary position and classifies it at once.
    pub fn from_board(board: Board) -> Self {
        let (done, winner) = if board.holds_line(Mark::Cross) {
            (true, Mark::Cross)
        } else if board.holds_line(Mark::Nought) {
            (true, Mark::Nought)
        } else {
            (board.is_full(), Mark::Empty)
        };
        GameState {
            board,
            done,
            winner,
        }
    }

    pub fn reset(&mut self) -> StateKey {
        self.board = Board::new();
        self.done = false;
        self.winner = Mark::Empty;
        self.state_key()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// `Mark::Empty` while in play and after a draw.
    pub fn winner(&self) -> Mark {
        self.winner
    }

    pub fn state_key(&self) -> StateKey {
        self.board.to_state_key()
    }

    pub fn legal_actions(&self) -> Vec<usize> {
        self.board.available_moves()
    }

    pub fn status(&self) -> IsGameOver {
        match (self.done, self.winner) {
            (false, _) => IsGameOver::InPlay,
            (true, Mark::Empty) => IsGameOver::Drawn,
            (true, mark) => IsGameOver::Win(mark),
        }
    }

    /// The line held by the winner, if the game was won on the board.
    pub fn winning_line(&self) -> Option<[usize; 3]> {
        self.board.winning_line(self.winner)
    }

    /// Plays `player` at `action`.
    ///
    /// Moving onto an occupied cell is not rejected: it ends the game as a
    /// forfeit, the other player wins and the mover gets a reward of -1.
    pub fn apply_move(&mut self, action: usize, player: Mark) -> Result<MoveOutcome, GameError> {
        if self.done {
            return Err(GameError::GameOver);
        }
        if !player.is_player() {
            return Err(GameError::NotAPlayer(player));
        }
        let cell = self.board.get(action).ok_or(GameError::OutOfRange(action))?;

        if cell != Mark::Empty {
            self.done = true;
            self.winner = player.other();
            return Ok(self.outcome(-1.0, MoveInfo::Invalid));
        }

        self.board.set(action, player);

        if self.board.holds_line(player) {
            self.done = true;
            self.winner = player;
            return Ok(self.outcome(1.0, MoveInfo::Winner(player)));
        }
        if self.board.is_full() {
            self.done = true;
            self.winner = Mark::Empty;
            return Ok(self.outcome(0.0, MoveInfo::Draw));
        }
        Ok(self.outcome(0.0, MoveInfo::None))
    }

    fn outcome(&self, reward: f64, info: MoveInfo) -> MoveOutcome {
        MoveOutcome {
            state: self.state_key(),
            reward,
            done: self.done,
            info,
        }
    }

    pub fn render(&self) -> String {
        self.board.render()
    }
}
