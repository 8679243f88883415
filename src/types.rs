use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::{BOARD_SIZE, Board};

/// Disc color, also used to name the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Black,
    White,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Player::Black => "black",
            Player::White => "white",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Player {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(Player::Black),
            "white" => Ok(Player::White),
            other => Err(format!("unknown player: {other}")),
        }
    }
}

/// A board coordinate, 0-indexed. Serialized as `[row, col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    /// Returns `None` when the coordinate lies off the 8×8 board.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    pub fn from_index(idx: usize) -> Self {
        Self {
            row: (idx / BOARD_SIZE) as u8,
            col: (idx % BOARD_SIZE) as u8,
        }
    }

    /// Human label: column letter then 1-based row, e.g. `D3` for (2, 3).
    pub fn label(self) -> String {
        let col = (b'A' + self.col) as char;
        format!("{col}{}", self.row + 1)
    }
}

impl TryFrom<(u8, u8)> for Position {
    type Error = String;

    fn try_from((row, col): (u8, u8)) -> Result<Self, Self::Error> {
        Position::new(row, col).ok_or_else(|| format!("off-board position ({row}, {col})"))
    }
}

impl From<Position> for (u8, u8) {
    fn from(pos: Position) -> Self {
        (pos.row, pos.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Computer opponent strength.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Normal,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// One line of the move log. Moves always lie on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", try_from = "RawHistoryEntry")]
pub enum HistoryEntry {
    Move { player: Player, row: u8, col: u8 },
    Pass { player: Player },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawHistoryEntry {
    Move { player: Player, row: u8, col: u8 },
    Pass { player: Player },
}

impl TryFrom<RawHistoryEntry> for HistoryEntry {
    type Error = String;

    fn try_from(raw: RawHistoryEntry) -> Result<Self, Self::Error> {
        match raw {
            RawHistoryEntry::Move { player, row, col } => {
                let pos = Position::try_from((row, col))?;
                Ok(HistoryEntry::Move {
                    player,
                    row: pos.row,
                    col: pos.col,
                })
            }
            RawHistoryEntry::Pass { player } => Ok(HistoryEntry::Pass { player }),
        }
    }
}

impl HistoryEntry {
    pub fn player(&self) -> Player {
        match *self {
            HistoryEntry::Move { player, .. } | HistoryEntry::Pass { player } => player,
        }
    }

    /// Log line as shown by the presentation layer, e.g. `3. black D3`.
    pub fn describe(&self, ordinal: usize) -> String {
        match *self {
            HistoryEntry::Move { player, row, col } => {
                format!("{ordinal}. {player} {}", Position { row, col }.label())
            }
            HistoryEntry::Pass { player } => format!("{ordinal}. {player} pass"),
        }
    }
}

/// Authoritative match state owned by the game controller.
///
/// The serialized shape is the `payload` of a `state` protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub board: Board,
    pub current_player: Player,
    pub game_over: bool,
    #[serde(rename = "passCount")]
    pub consecutive_passes: u8,
    pub last_move: Option<Position>,
    pub move_history: Vec<HistoryEntry>,
}

impl GameState {
    pub fn new(start_player: Player) -> Self {
        Self {
            board: Board::new(),
            current_player: start_player,
            game_over: false,
            consecutive_passes: 0,
            last_move: None,
            move_history: Vec::new(),
        }
    }

    /// Final (or current) disc comparison.
    pub fn result(&self) -> GameResult {
        let (black_count, white_count) = self.board.count();
        GameResult {
            winner: if black_count > white_count {
                Some(Player::Black)
            } else if white_count > black_count {
                Some(Player::White)
            } else {
                None
            },
            black_count,
            white_count,
        }
    }

    /// CRC32 over the canonical JSON encoding; equal states give equal sums.
    pub fn checksum(&self) -> u32 {
        match serde_json::to_vec(self) {
            Ok(bytes) => crc32fast::hash(&bytes),
            Err(_) => 0,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Player::Black)
    }
}

/// Final result after game over. `winner` is `None` on a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub winner: Option<Player>,
    pub black_count: u8,
    pub white_count: u8,
}

impl GameResult {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}
