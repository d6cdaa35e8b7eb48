use crate::board::Mark;
use std::path::PathBuf;

/// Errors raised by the game engine and the agents playing on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("the game is already over")]
    GameOver,

    #[error("cell {0} is outside the 3x3 board")]
    OutOfRange(usize),

    #[error("{0:?} is not a player mark")]
    NotAPlayer(Mark),

    #[error("no legal actions available")]
    NoLegalActions,

    #[error("invalid cell value {0} (expected -1, 0 or 1)")]
    InvalidCell(i8),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
