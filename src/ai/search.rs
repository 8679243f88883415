use crate::board::Board;
use crate::types::{Difficulty, Player, Position};

/// Plies searched by the hard level and by hints.
pub const HARD_SEARCH_DEPTH: u8 = 2;
const DISC_WEIGHT: i32 = 10;
const MOBILITY_WEIGHT: i32 = 3;

/// Score of a searched position plus the move that achieves it at this node.
/// `best_move` is `None` for leaves and for forced passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub score: i32,
    pub best_move: Option<Position>,
}

impl SearchResult {
    fn leaf(score: i32) -> Self {
        Self {
            score,
            best_move: None,
        }
    }
}

/// Static evaluation from `player`'s perspective:
/// `10 × disc difference + 3 × mobility difference`.
pub fn evaluate(board: &Board, player: Player) -> i32 {
    let opponent = player.opponent();
    let discs = board.count_of(player) as i32 - board.count_of(opponent) as i32;
    let mobility = board.mobility(player) as i32 - board.mobility(opponent) as i32;
    DISC_WEIGHT * discs + MOBILITY_WEIGHT * mobility
}

/// Depth-bounded minimax. `maximizer` is the side that started the search;
/// nodes where `to_move == maximizer` maximize, the others minimize.
///
/// A side without moves forfeits the ply: the opponent moves next and the
/// remaining depth drops by one, so max/min roles stay tied to whoever is
/// actually on move.
pub fn minimax(board: &Board, to_move: Player, depth: u8, maximizer: Player) -> SearchResult {
    let moves = board.all_legal_moves(to_move);
    let stuck = moves.is_empty() && !board.has_legal_move(to_move.opponent());
    if depth == 0 || stuck {
        return SearchResult::leaf(evaluate(board, maximizer));
    }

    if moves.is_empty() {
        let forced = minimax(board, to_move.opponent(), depth - 1, maximizer);
        return SearchResult::leaf(forced.score);
    }

    let maximizing = to_move == maximizer;
    let mut best: Option<SearchResult> = None;

    for mv in moves {
        let next = board.apply_move(mv, to_move);
        let score = minimax(&next, to_move.opponent(), depth - 1, maximizer).score;
        if is_better_score(score, best.map(|b| b.score), maximizing) {
            best = Some(SearchResult {
                score,
                best_move: Some(mv),
            });
        }
    }

    best.unwrap_or_else(|| SearchResult::leaf(evaluate(board, maximizer)))
}

/// Picks a move for `player`. Returns `None` only when there is no legal move.
pub fn select_move(board: &Board, player: Player, difficulty: Difficulty) -> Option<Position> {
    let moves = board.all_legal_moves(player);
    let first = *moves.first()?;

    match difficulty {
        Difficulty::Easy => Some(first),
        Difficulty::Normal => {
            let mut best = first;
            let mut best_flips = 0;
            for mv in moves {
                let flips = board.legal_flips(mv, player).count_ones();
                if flips > best_flips {
                    best_flips = flips;
                    best = mv;
                }
            }
            Some(best)
        }
        Difficulty::Hard => minimax(board, player, HARD_SEARCH_DEPTH, player)
            .best_move
            .or(Some(first)),
    }
}

/// Suggested move for the side to move, always at hard strength.
pub fn hint(board: &Board, player: Player) -> Option<Position> {
    select_move(board, player, Difficulty::Hard)
}

// Strict comparison keeps the first row-major move on ties.
fn is_better_score(score: i32, best: Option<i32>, maximizing: bool) -> bool {
    match best {
        None => true,
        Some(best) if maximizing => score > best,
        Some(best) => score < best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_BOARD: u64 = u64::MAX;

    fn at(row: u8, col: u8) -> Position {
        Position::new(row, col).unwrap()
    }

    fn bit(row: u8, col: u8) -> u64 {
        1u64 << at(row, col).index()
    }

    #[test]
    fn evaluate_weights_discs_and_mobility() {
        let board = Board::new();
        // Symmetric opening: equal discs, equal mobility.
        assert_eq!(evaluate(&board, Player::Black), 0);

        let next = board.apply_move(at(2, 3), Player::Black);
        // 4 vs 1 discs; black mobility 3, white mobility 3.
        let expected = 10 * 3 + 3 * (next.mobility(Player::Black) as i32
            - next.mobility(Player::White) as i32);
        assert_eq!(evaluate(&next, Player::Black), expected);
        assert_eq!(evaluate(&next, Player::White), -expected);
    }

    #[test]
    fn minimax_depth_zero_equals_static_evaluation() {
        let board = Board::new().apply_move(at(2, 3), Player::Black);

        let result = minimax(&board, Player::White, 0, Player::White);

        assert_eq!(result.score, evaluate(&board, Player::White));
        assert_eq!(result.best_move, None);
    }

    #[test]
    fn minimax_ignores_depth_when_neither_side_can_move() {
        let black = FULL_BOARD ^ bit(0, 0) ^ bit(7, 7);
        let board = Board::from_bitboards(black, 0);
        assert!(!board.has_legal_move(Player::Black));
        assert!(!board.has_legal_move(Player::White));

        let direct = evaluate(&board, Player::White);
        for depth in 0..5 {
            let result = minimax(&board, Player::White, depth, Player::White);
            assert_eq!(result.score, direct);
        }
    }

    #[test]
    fn forced_pass_consumes_a_ply_and_keeps_roles() {
        // Black has no move; white can take (0,0) flipping (0,1).
        let black = bit(0, 1);
        let white = FULL_BOARD ^ bit(0, 0) ^ black;
        let board = Board::from_bitboards(black, white);
        assert!(!board.has_legal_move(Player::Black));

        let result = minimax(&board, Player::Black, 2, Player::Black);
        let after_white = board.apply_move(at(0, 0), Player::White);

        assert_eq!(result.best_move, None);
        assert_eq!(result.score, evaluate(&after_white, Player::Black));
    }

    #[test]
    fn easy_returns_row_major_first_move() {
        let board = Board::new();

        assert_eq!(
            select_move(&board, Player::Black, Difficulty::Easy),
            Some(at(2, 3))
        );
    }

    #[test]
    fn normal_prefers_most_flips_then_row_major() {
        // (0,0) flips two along row 0; (2,0) flips one vertically.
        let black = bit(0, 3) | bit(4, 0);
        let white = bit(0, 1) | bit(0, 2) | bit(3, 0);
        let board = Board::from_bitboards(black, white);

        assert_eq!(
            select_move(&board, Player::Black, Difficulty::Normal),
            Some(at(0, 0))
        );

        // Opening: every move flips one, so the first wins.
        assert_eq!(
            select_move(&Board::new(), Player::Black, Difficulty::Normal),
            Some(at(2, 3))
        );
    }

    #[test]
    fn hard_breaks_ties_by_row_major_order() {
        // All four opening replies are symmetric, so the first must win.
        assert_eq!(
            select_move(&Board::new(), Player::Black, Difficulty::Hard),
            Some(at(2, 3))
        );
    }

    #[test]
    fn hard_looks_past_the_greedy_choice() {
        // Every black reply flips one disc; one ply deeper, (5, 4) leaves
        // white the weakest answer (-6 against -8, -9 and -12).
        let board = Board::new()
            .apply_move(at(2, 3), Player::Black)
            .apply_move(at(2, 2), Player::White);

        assert_eq!(select_move(&board, Player::Black, Difficulty::Easy), Some(at(2, 1)));
        assert_eq!(select_move(&board, Player::Black, Difficulty::Normal), Some(at(2, 1)));
        assert_eq!(select_move(&board, Player::Black, Difficulty::Hard), Some(at(5, 4)));
        assert_eq!(
            minimax(&board, Player::Black, HARD_SEARCH_DEPTH, Player::Black).score,
            -6
        );
    }

    #[test]
    fn select_move_without_legal_moves_is_none() {
        let board = Board::from_bitboards(FULL_BOARD ^ bit(0, 0), 0);

        assert_eq!(select_move(&board, Player::White, Difficulty::Hard), None);
        assert_eq!(hint(&board, Player::White), None);
    }
}
