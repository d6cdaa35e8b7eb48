use crate::board::{GameState, Mark, MoveOutcome};
use crate::error::GameError;
use crate::players::Player;
use serde::Serialize;
use std::{fmt, mem};

pub mod board;
pub mod config;
pub mod error;
pub mod players;
pub mod q_table;
pub mod training;

pub use board::{Board, StateKey};
pub use config::{EvaluationConfig, Hyperparameters, TrainingConfig};
pub use players::{MinimaxPlayer, QLearningPlayer, RandomPlayer};
pub use q_table::{QLearningAgent, QTable};
pub use training::{evaluate, evaluate_vs_random, train, train_vs_random};

/// Win/loss/draw counts from one side's point of view.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutcomeStats {
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

impl OutcomeStats {
    pub fn record(&mut self, winner: Mark, me: Mark) {
        if winner == Mark::Empty {
            self.draws += 1;
        } else if winner == me {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
    pub fn total(&self) -> usize {
        self.wins + self.losses + self.draws
    }
    pub fn win_rate(&self) -> f64 {
        self.rate(self.wins)
    }
    pub fn loss_rate(&self) -> f64 {
        self.rate(self.losses)
    }
    pub fn draw_rate(&self) -> f64 {
        self.rate(self.draws)
    }
    fn rate(&self, count: usize) -> f64 {
        match self.total() {
            0 => 0.0,
            total => count as f64 / total as f64,
        }
    }
}

impl fmt::Display for OutcomeStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "W:{} ({:.2}%) L:{} ({:.2}%) D:{} ({:.2}%)",
            self.wins,
            self.win_rate() * 100.0,
            self.losses,
            self.loss_rate() * 100.0,
            self.draws,
            self.draw_rate() * 100.0
        )
    }
}

/// One match between two players. X always moves first.
pub struct Game<'a> {
    pub state: GameState,
    pub current_player: Box<dyn Player + 'a>,
    pub other_player: Box<dyn Player + 'a>,
    current_mark: Mark,
}

impl<'a> Game<'a> {
    pub fn new(cross: Box<dyn Player + 'a>, nought: Box<dyn Player + 'a>) -> Self {
        Game {
            state: GameState::new(),
            current_player: cross,
            other_player: nought,
            current_mark: Mark::Cross,
        }
    }

    pub fn current_mark(&self) -> Mark {
        self.current_mark
    }

    pub fn swap_players(&mut self) {
        mem::swap(&mut self.current_player, &mut self.other_player);
        self.current_mark = self.current_mark.other();
    }

    /// Lets the player to move pick and play one move.
    pub fn play_turn(&mut self) -> Result<MoveOutcome, GameError> {
        let mv = self.current_player.choose_move(&self.state, self.current_mark)?;
        let outcome = self.state.apply_move(mv, self.current_mark)?;
        if !outcome.done {
            self.swap_players();
        }
        Ok(outcome)
    }

    /// Plays until the game ends and returns the winner (`Mark::Empty` for a draw).
    pub fn play(&mut self) -> Result<Mark, GameError> {
        while !self.state.is_done() {
            self.play_turn()?;
        }
        Ok(self.state.winner())
    }
}
