use thiserror::Error;

use crate::types::Position;

/// A rejected game intent. Returned before any state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("game is already over")]
    GameOver,

    #[error("it is not the player's turn")]
    NotYourTurn,

    #[error("computer opponent is thinking")]
    AiThinking,

    #[error("row/col out of range: ({row}, {col})")]
    OutOfRange { row: u8, col: u8 },

    #[error("illegal move at {0}")]
    IllegalMove(Position),

    #[error("pass is only allowed when no legal move exists")]
    PassNotAllowed,
}

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Relay transport failure.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("relay dispatcher has shut down")]
    DispatcherClosed,
}
