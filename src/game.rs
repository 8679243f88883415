use log::{debug, info, warn};
use serde::Serialize;
use web_time::Instant;

use crate::ai::search;
use crate::board::{Board, positions};
use crate::config::ControllerConfig;
use crate::error::GameError;
use crate::history::UndoStack;
use crate::schedule::{Scheduler, TaskKind};
use crate::types::{Difficulty, GameResult, GameState, HistoryEntry, Player, Position};

pub trait MoveSelector: Send + Sync {
    fn select_move(&self, board: &Board, player: Player, difficulty: Difficulty)
    -> Option<Position>;
}

/// Default computer opponent backed by [`search::select_move`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchSelector;

impl MoveSelector for SearchSelector {
    fn select_move(
        &self,
        board: &Board,
        player: Player,
        difficulty: Difficulty,
    ) -> Option<Position> {
        search::select_move(board, player, difficulty)
    }
}

/// Where a state transition came from. Only `Local` transitions are
/// published to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Local,
    Remote,
}

/// Notification for the presentation layer and the sync client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GameEvent {
    Moved {
        player: Player,
        position: Position,
        flipped: Vec<Position>,
        origin: Origin,
    },
    Passed {
        player: Player,
        /// Forced by the controller rather than requested.
        automatic: bool,
        origin: Origin,
    },
    GameOver {
        result: GameResult,
    },
    Reset {
        origin: Origin,
    },
    Undone,
    Resynced {
        checksum: u32,
    },
}

pub struct GameController {
    state: GameState,
    legal: u64,
    config: ControllerConfig,
    undo: UndoStack,
    scheduler: Scheduler,
    selector: Box<dyn MoveSelector>,
    events: Vec<GameEvent>,
}

impl GameController {
    pub fn new(config: ControllerConfig) -> Self {
        Self::with_selector(config, Box::new(SearchSelector))
    }

    pub fn with_selector(config: ControllerConfig, selector: Box<dyn MoveSelector>) -> Self {
        let state = GameState::new(config.start_player);
        let legal = state.board.legal_moves(state.current_player);
        Self {
            state,
            legal,
            undo: UndoStack::new(config.undo_capacity),
            config,
            scheduler: Scheduler::new(),
            selector,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Legal moves of the side to move, row-major.
    pub fn legal_moves(&self) -> Vec<Position> {
        positions(self.legal)
    }

    pub fn is_ai_turn(&self) -> bool {
        !self.state.game_over && self.config.ai_side == Some(self.state.current_player)
    }

    pub fn is_ai_pending(&self) -> bool {
        self.scheduler.is_pending(TaskKind::AiMove)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Result once the game is over.
    pub fn result(&self) -> Option<GameResult> {
        self.state.game_over.then(|| self.state.result())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Places a disc for the side to move.
    ///
    /// Local intents are refused while the computer owns the turn; remote
    /// moves only need to be legal.
    pub fn play(&mut self, row: u8, col: u8, origin: Origin, now: Instant) -> Result<(), GameError> {
        let pos = Position::new(row, col).ok_or(GameError::OutOfRange { row, col })?;
        if self.state.game_over {
            return Err(GameError::GameOver);
        }
        if origin == Origin::Local {
            if self.is_ai_turn() {
                return Err(GameError::NotYourTurn);
            }
            if self.is_ai_pending() {
                return Err(GameError::AiThinking);
            }
        }

        let flips = self.state.board.legal_flips(pos, self.state.current_player);
        if flips == 0 {
            return Err(GameError::IllegalMove(pos));
        }

        self.commit_move(pos, flips, origin, now);
        Ok(())
    }

    /// Passes the turn. Only valid when the side to move has no legal move.
    pub fn pass(&mut self, origin: Origin, now: Instant) -> Result<(), GameError> {
        if self.state.game_over {
            return Err(GameError::GameOver);
        }
        if origin == Origin::Local && self.is_ai_turn() {
            return Err(GameError::NotYourTurn);
        }
        if self.legal != 0 {
            return Err(GameError::PassNotAllowed);
        }

        self.commit_pass(false, origin, now);
        Ok(())
    }

    pub fn new_game(&mut self, origin: Origin, now: Instant) {
        self.scheduler.cancel_all();
        self.state = GameState::new(self.config.start_player);
        self.undo.clear();
        self.recompute();
        info!("new game, {} to move", self.state.current_player);
        self.events.push(GameEvent::Reset { origin });
        self.refresh(now);
    }

    /// Restores the latest snapshot. Returns `false` when there is none.
    pub fn undo(&mut self, now: Instant) -> bool {
        let Some(snapshot) = self.undo.pop() else {
            return false;
        };

        self.scheduler.cancel_all();
        self.state = snapshot;
        self.recompute();
        debug!("undo, {} snapshots left", self.undo.len());
        self.events.push(GameEvent::Undone);
        self.refresh(now);
        true
    }

    /// Substitutes the whole state (network resync). Undo history is left as is.
    pub fn replace_state(&mut self, state: GameState, now: Instant) {
        self.scheduler.cancel_all();
        self.state = state;
        self.recompute();
        let checksum = self.state.checksum();
        debug!("state replaced, checksum {checksum:#010x}");
        self.events.push(GameEvent::Resynced { checksum });
        self.refresh(now);
    }

    /// Changes the computer side or strength; a pending computer move is
    /// cancelled and rescheduled from `now`.
    pub fn set_ai(&mut self, side: Option<Player>, difficulty: Difficulty, now: Instant) {
        self.scheduler.cancel(TaskKind::AiMove);
        self.config.ai_side = side;
        self.config.difficulty = difficulty;
        self.refresh(now);
    }

    pub fn set_start_player(&mut self, player: Player) {
        self.config.start_player = player;
    }

    /// Suggested move for the human to move, searched at hard strength.
    pub fn hint(&self) -> Option<Position> {
        if self.state.game_over || self.is_ai_turn() || self.is_ai_pending() {
            return None;
        }
        search::hint(&self.state.board, self.state.current_player)
    }

    /// Runs every scheduled task that is due at `now`.
    pub fn advance(&mut self, now: Instant) {
        self.refresh(now);
        while let Some(token) = self.scheduler.take_due(now) {
            match token.kind {
                TaskKind::Settle => self.on_settle(now),
                TaskKind::AutoPass => self.on_auto_pass(now),
                TaskKind::AiMove => self.on_ai_move(now),
            }
        }
    }

    fn commit_move(&mut self, pos: Position, flips: u64, origin: Origin, now: Instant) {
        let player = self.state.current_player;
        self.undo.push(self.state.clone());

        self.state.board = self.state.board.apply_move(pos, player);
        self.state.consecutive_passes = 0;
        self.state.last_move = Some(pos);
        self.state.move_history.push(HistoryEntry::Move {
            player,
            row: pos.row,
            col: pos.col,
        });
        self.state.current_player = player.opponent();
        self.recompute();

        self.scheduler.cancel_all();
        self.scheduler
            .schedule(TaskKind::Settle, now, self.config.settle_delay);

        debug!("{player} played {} flipping {}", pos.label(), flips.count_ones());
        self.events.push(GameEvent::Moved {
            player,
            position: pos,
            flipped: positions(flips),
            origin,
        });
    }

    fn commit_pass(&mut self, automatic: bool, origin: Origin, now: Instant) {
        let player = self.state.current_player;
        self.undo.push(self.state.clone());

        self.state.move_history.push(HistoryEntry::Pass { player });
        self.state.consecutive_passes = self.state.consecutive_passes.saturating_add(1);
        self.state.current_player = player.opponent();
        self.recompute();
        self.scheduler.cancel_all();

        debug!("{player} passed");
        self.events.push(GameEvent::Passed {
            player,
            automatic,
            origin,
        });

        if self.legal == 0 {
            self.end_game();
        } else {
            self.refresh(now);
        }
    }

    fn end_game(&mut self) {
        self.state.game_over = true;
        self.scheduler.cancel_all();
        let result = self.state.result();
        match result.winner {
            Some(winner) => info!(
                "game over: {winner} wins {}:{}",
                result.black_count, result.white_count
            ),
            None => info!(
                "game over: draw {}:{}",
                result.black_count, result.white_count
            ),
        }
        self.events.push(GameEvent::GameOver { result });
    }

    fn on_settle(&mut self, now: Instant) {
        if self.state.game_over {
            return;
        }
        if self.legal != 0 {
            self.refresh(now);
        } else if self.state.consecutive_passes == 0 {
            self.commit_pass(true, Origin::Local, now);
        } else {
            self.end_game();
        }
    }

    fn on_auto_pass(&mut self, now: Instant) {
        if self.state.game_over {
            return;
        }
        if self.legal == 0 {
            self.commit_pass(true, Origin::Local, now);
        } else {
            self.refresh(now);
        }
    }

    fn on_ai_move(&mut self, now: Instant) {
        if !self.is_ai_turn() {
            self.refresh(now);
            return;
        }
        if self.legal == 0 {
            self.commit_pass(false, Origin::Local, now);
            return;
        }

        let player = self.state.current_player;
        let board = self.state.board;
        let chosen = self
            .selector
            .select_move(&board, player, self.config.difficulty)
            .filter(|&pos| board.is_legal(pos, player));
        let pos = match chosen {
            Some(pos) => pos,
            None => {
                warn!("move selector returned no legal move for {player}; using first legal move");
                Position::from_index(self.legal.trailing_zeros() as usize)
            }
        };

        let flips = board.legal_flips(pos, player);
        self.commit_move(pos, flips, Origin::Local, now);
    }

    /// Schedules whatever the current position calls for: a computer move,
    /// or an automatic pass for a human without moves.
    fn refresh(&mut self, now: Instant) {
        if self.state.game_over || self.scheduler.is_pending(TaskKind::Settle) {
            return;
        }

        if self.is_ai_turn() {
            if !self.scheduler.is_pending(TaskKind::AiMove)
                && !self.scheduler.is_pending(TaskKind::AutoPass)
            {
                self.scheduler
                    .schedule(TaskKind::AiMove, now, self.config.ai_delay);
            }
        } else if self.legal == 0 && !self.scheduler.is_pending(TaskKind::AutoPass) {
            self.scheduler
                .schedule(TaskKind::AutoPass, now, self.config.auto_pass_delay);
        }
    }

    fn recompute(&mut self) {
        self.legal = self.state.board.legal_moves(self.state.current_player);
    }

    #[cfg(test)]
    fn set_board_for_test(&mut self, board: Board, current_player: Player) {
        self.scheduler.cancel_all();
        self.state.board = board;
        self.state.current_player = current_player;
        self.state.game_over = false;
        self.state.consecutive_passes = 0;
        self.recompute();
    }
}
