use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Player, Position};

pub const BOARD_SIZE: usize = 8;
pub const NUM_SQUARES: usize = BOARD_SIZE * BOARD_SIZE;
const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// For every square and direction, the squares walked outward, nearest first.
static RAYS: Lazy<Vec<[Vec<usize>; 8]>> = Lazy::new(|| {
    (0..NUM_SQUARES)
        .map(|pos| {
            let (row, col) = pos_to_row_col(pos);
            std::array::from_fn(|dir| {
                let (dr, dc) = DIRECTIONS[dir];
                let mut ray = Vec::new();
                let mut r = row + dr;
                let mut c = col + dc;
                while in_bounds(r, c) {
                    ray.push((r as usize) * BOARD_SIZE + c as usize);
                    r += dr;
                    c += dc;
                }
                ray
            })
        })
        .collect()
});

/// Reversi board state represented by two bitboards.
///
/// Bit `row * 8 + col` is set when that square holds a disc, so ascending
/// bit order is row-major order. All operations are pure: `apply_move`
/// returns a new board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    black: u64,
    white: u64,
}

impl Board {
    /// Creates the initial board:
    /// d4=white, e4=black, d5=black, e5=white.
    pub fn new() -> Self {
        Self {
            black: bit(28) | bit(35),
            white: bit(27) | bit(36),
        }
    }

    pub fn empty() -> Self {
        Self { black: 0, white: 0 }
    }

    pub fn from_bitboards(black: u64, white: u64) -> Self {
        debug_assert_eq!(black & white, 0, "a square cannot hold two discs");
        Self {
            black,
            white: white & !black,
        }
    }

    pub fn bits(&self, player: Player) -> u64 {
        match player {
            Player::Black => self.black,
            Player::White => self.white,
        }
    }

    pub fn get(&self, pos: Position) -> Option<Player> {
        let square = bit(pos.index());
        if (self.black & square) != 0 {
            Some(Player::Black)
        } else if (self.white & square) != 0 {
            Some(Player::White)
        } else {
            None
        }
    }

    /// Returns the flip set of placing `player` at `pos` as a bit mask.
    /// Empty (0) for occupied squares and for moves that bracket nothing.
    pub fn legal_flips(&self, pos: Position, player: Player) -> u64 {
        let (me, opp) = self.sides(player);
        collect_flips(pos.index(), me, opp)
    }

    pub fn is_legal(&self, pos: Position, player: Player) -> bool {
        self.legal_flips(pos, player) != 0
    }

    /// Returns legal move mask for the given side.
    pub fn legal_moves(&self, player: Player) -> u64 {
        let (me, opp) = self.sides(player);
        let occupied = me | opp;
        let mut legal = 0u64;

        for pos in 0..NUM_SQUARES {
            let move_bit = bit(pos);
            if (occupied & move_bit) != 0 {
                continue;
            }
            if collect_flips(pos, me, opp) != 0 {
                legal |= move_bit;
            }
        }

        legal
    }

    /// Legal moves in row-major order.
    pub fn all_legal_moves(&self, player: Player) -> Vec<Position> {
        positions(self.legal_moves(player))
    }

    pub fn mobility(&self, player: Player) -> u32 {
        self.legal_moves(player).count_ones()
    }

    pub fn has_legal_move(&self, player: Player) -> bool {
        self.legal_moves(player) != 0
    }

    /// Places a disc and flips the bracketed runs, returning the new board.
    /// An illegal move returns the board unchanged.
    pub fn apply_move(&self, pos: Position, player: Player) -> Board {
        let (me, opp) = self.sides(player);
        let flips = collect_flips(pos.index(), me, opp);
        if flips == 0 {
            return *self;
        }

        let next_me = me | bit(pos.index()) | flips;
        let next_opp = opp & !flips;

        match player {
            Player::Black => Board {
                black: next_me,
                white: next_opp,
            },
            Player::White => Board {
                black: next_opp,
                white: next_me,
            },
        }
    }

    /// Returns `(black_count, white_count)`.
    pub fn count(&self) -> (u8, u8) {
        (self.black.count_ones() as u8, self.white.count_ones() as u8)
    }

    pub fn count_of(&self, player: Player) -> u8 {
        self.bits(player).count_ones() as u8
    }

    /// Returns the number of empty squares.
    pub fn empty_count(&self) -> u8 {
        let (black_count, white_count) = self.count();
        NUM_SQUARES as u8 - black_count - white_count
    }

    pub fn to_grid(&self) -> [[Option<Player>; BOARD_SIZE]; BOARD_SIZE] {
        std::array::from_fn(|row| {
            std::array::from_fn(|col| self.get(Position::from_index(row * BOARD_SIZE + col)))
        })
    }

    pub fn from_grid(grid: &[[Option<Player>; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        let mut board = Board::empty();
        for (row, cells) in grid.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let square = bit(row * BOARD_SIZE + col);
                match cell {
                    Some(Player::Black) => board.black |= square,
                    Some(Player::White) => board.white |= square,
                    None => {}
                }
            }
        }
        board
    }

    fn sides(&self, player: Player) -> (u64, u64) {
        match player {
            Player::Black => (self.black, self.white),
            Player::White => (self.white, self.black),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_grid().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let grid = <[[Option<Player>; BOARD_SIZE]; BOARD_SIZE]>::deserialize(deserializer)?;
        Ok(Board::from_grid(&grid))
    }
}

/// Converts a square mask into positions, row-major.
pub fn positions(mut mask: u64) -> Vec<Position> {
    let mut out = Vec::with_capacity(mask.count_ones() as usize);
    while mask != 0 {
        out.push(Position::from_index(mask.trailing_zeros() as usize));
        mask &= mask - 1;
    }
    out
}

fn collect_flips(pos: usize, me: u64, opp: u64) -> u64 {
    if pos >= NUM_SQUARES {
        return 0;
    }
    if ((me | opp) & bit(pos)) != 0 {
        return 0;
    }

    let mut flips = 0u64;
    for ray in &RAYS[pos] {
        let mut line = 0u64;
        for &square in ray {
            let square = bit(square);
            if (opp & square) != 0 {
                line |= square;
            } else {
                if (me & square) != 0 {
                    flips |= line;
                }
                break;
            }
        }
    }

    flips
}

fn bit(pos: usize) -> u64 {
    if pos < NUM_SQUARES { 1u64 << pos } else { 0 }
}

fn pos_to_row_col(pos: usize) -> (i32, i32) {
    ((pos / BOARD_SIZE) as i32, (pos % BOARD_SIZE) as i32)
}

fn in_bounds(row: i32, col: i32) -> bool {
    (0..BOARD_SIZE as i32).contains(&row) && (0..BOARD_SIZE as i32).contains(&col)
}
