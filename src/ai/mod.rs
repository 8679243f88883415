//! Computer opponent: static evaluation and bounded minimax.

pub mod search;

pub use search::{HARD_SEARCH_DEPTH, SearchResult, evaluate, hint, minimax, select_move};
