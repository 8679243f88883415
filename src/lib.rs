use wasm_bindgen::prelude::*;

pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod history;
pub mod protocol;
pub mod relay;
pub mod schedule;
pub mod sync;
pub mod types;
pub mod wasm;

pub use board::Board;
pub use error::GameError;
pub use game::{GameController, GameEvent, Origin};
pub use sync::{SyncClient, Transport};
pub use types::{Difficulty, GameState, Player, Position};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
