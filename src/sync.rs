//! Networked session around a [`GameController`].
//!
//! Local transitions are published as protocol messages; relayed messages
//! from other room members are applied with [`Origin::Remote`] so they are
//! never published again.

use log::{debug, info, warn};
use serde::Serialize;
use web_time::{Instant, SystemTime, UNIX_EPOCH};

use crate::config::DEFAULT_ROOM;
use crate::error::GameError;
use crate::game::{GameController, GameEvent, Origin};
use crate::protocol::{ClientMessage, JoinMode, Participant, Role, ServerMessage};
use crate::types::{Difficulty, GameState, Player, Position};

/// Outgoing half of the client connection.
pub trait Transport {
    fn send(&mut self, frame: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
    Connecting,
    /// Joined, fewer than two players in the room.
    Waiting,
    Ready,
    OpponentLeft,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    pub sender_id: Option<String>,
    pub text: String,
}

/// What to send in the `join` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub room_id: String,
    pub name: String,
    pub mode: JoinMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            room_id: DEFAULT_ROOM.to_string(),
            name: generated_name(),
            mode: JoinMode::Player,
        }
    }
}

/// `User-N` with N below 1000, derived from the wall clock.
pub fn generated_name() -> String {
    let n = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_micros() % 1000)
        .unwrap_or(0);
    format!("User-{n}")
}

pub struct SyncClient<T: Transport> {
    game: GameController,
    transport: T,
    session: SessionConfig,
    status: ConnectionStatus,
    client_id: Option<String>,
    room_id: Option<String>,
    role: Option<Role>,
    players: Vec<Participant>,
    spectators: Vec<Participant>,
    chat: Vec<ChatLine>,
    events: Vec<GameEvent>,
}

impl<T: Transport> SyncClient<T> {
    pub fn new(game: GameController, transport: T, session: SessionConfig) -> Self {
        Self {
            game,
            transport,
            session,
            status: ConnectionStatus::Connecting,
            client_id: None,
            room_id: None,
            role: None,
            players: Vec::new(),
            spectators: Vec::new(),
            chat: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn game(&self) -> &GameController {
        &self.game
    }

    pub fn state(&self) -> &GameState {
        self.game.state()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn players(&self) -> &[Participant] {
        &self.players
    }

    pub fn spectators(&self) -> &[Participant] {
        &self.spectators
    }

    pub fn chat_log(&self) -> &[ChatLine] {
        &self.chat
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.game.next_deadline()
    }

    /// Controller events since the last call, local and remote alike.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Transport opened: request a seat.
    pub fn on_open(&mut self) {
        self.status = ConnectionStatus::Connecting;
        let join = ClientMessage::Join {
            room_id: Some(self.session.room_id.clone()),
            name: Some(self.session.name.clone()),
            mode: self.session.mode,
        };
        self.send(&join);
    }

    pub fn on_close(&mut self) {
        info!("connection to relay closed");
        self.status = ConnectionStatus::Disconnected;
        self.client_id = None;
    }

    /// Handles one frame from the relay. Malformed frames are dropped.
    pub fn on_message(&mut self, raw: &str, now: Instant) {
        let msg = match ServerMessage::parse(raw) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("dropping malformed relay frame: {e}");
                return;
            }
        };

        if let Some(sender) = msg.sender_id()
            && self.client_id.as_deref() == Some(sender)
        {
            debug!("ignoring echo of own message");
            return;
        }

        match msg {
            ServerMessage::Joined {
                room_id,
                client_id,
                role,
                players,
                spectators,
            } => {
                info!("joined room {room_id:?} as {role:?} (id {client_id})");
                self.client_id = Some(client_id);
                self.room_id = Some(room_id);
                self.role = Some(role);
                self.update_roster(players, spectators);
            }
            ServerMessage::Presence { players, spectators } => {
                self.update_roster(players, spectators);
                if self.role == Some(Role::Player1) {
                    self.publish_state();
                }
            }
            ServerMessage::Ready => self.status = ConnectionStatus::Ready,
            ServerMessage::OpponentLeft { id, role } => {
                self.players.retain(|p| p.id != id);
                self.spectators.retain(|p| p.id != id);
                if role.is_none_or(Role::is_player) {
                    info!("opponent {id} left");
                    self.status = ConnectionStatus::OpponentLeft;
                }
            }
            ServerMessage::Move { row, col, .. } => {
                if let Err(e) = self.game.play(row, col, Origin::Remote, now) {
                    warn!("remote move ({row}, {col}) rejected: {e}");
                }
            }
            ServerMessage::Pass { .. } => {
                if let Err(e) = self.game.pass(Origin::Remote, now) {
                    debug!("remote pass ignored: {e}");
                }
            }
            ServerMessage::NewGame { .. } => self.game.new_game(Origin::Remote, now),
            ServerMessage::State { payload, .. } => {
                let local = self.game.state().checksum();
                let remote = payload.checksum();
                if local == remote {
                    debug!("state {remote:#010x} already applied");
                } else {
                    debug!("resync {local:#010x} -> {remote:#010x}");
                    self.game.replace_state(payload, now);
                }
            }
            ServerMessage::Chat { text, sender_id } => self.chat.push(ChatLine { sender_id, text }),
        }

        self.flush();
    }

    pub fn play(&mut self, row: u8, col: u8, now: Instant) -> Result<(), GameError> {
        let result = self.game.play(row, col, Origin::Local, now);
        self.flush();
        result
    }

    pub fn pass(&mut self, now: Instant) -> Result<(), GameError> {
        let result = self.game.pass(Origin::Local, now);
        self.flush();
        result
    }

    /// Starts over, optionally from a different side.
    pub fn new_game(&mut self, start: Option<Player>, now: Instant) {
        if let Some(player) = start {
            self.game.set_start_player(player);
        }
        self.game.new_game(Origin::Local, now);
        self.flush();
    }

    /// Undoes locally and publishes the restored state.
    pub fn undo(&mut self, now: Instant) -> bool {
        let undone = self.game.undo(now);
        self.flush();
        undone
    }

    pub fn set_ai(&mut self, side: Option<Player>, difficulty: Difficulty, now: Instant) {
        self.game.set_ai(side, difficulty, now);
        self.flush();
    }

    pub fn hint(&self) -> Option<Position> {
        self.game.hint()
    }

    /// Runs due controller tasks; computer moves and automatic passes are
    /// published like any local action.
    pub fn advance(&mut self, now: Instant) {
        self.game.advance(now);
        self.flush();
    }

    pub fn send_chat(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.chat.push(ChatLine {
            sender_id: self.client_id.clone(),
            text: text.clone(),
        });
        self.send(&ClientMessage::Chat { text });
    }

    /// Sends the full local state for peers to adopt.
    pub fn publish_state(&mut self) {
        let payload = self.game.state().clone();
        self.send(&ClientMessage::State { payload });
    }

    fn update_roster(&mut self, players: Vec<Participant>, spectators: Vec<Participant>) {
        self.status = if players.len() >= 2 {
            ConnectionStatus::Ready
        } else if self.status == ConnectionStatus::OpponentLeft {
            ConnectionStatus::OpponentLeft
        } else {
            ConnectionStatus::Waiting
        };
        self.players = players;
        self.spectators = spectators;
    }

    fn flush(&mut self) {
        for event in self.game.drain_events() {
            match &event {
                GameEvent::Moved {
                    position,
                    origin: Origin::Local,
                    ..
                } => self.send(&ClientMessage::Move {
                    row: position.row,
                    col: position.col,
                }),
                GameEvent::Passed {
                    origin: Origin::Local,
                    ..
                } => self.send(&ClientMessage::Pass),
                GameEvent::Reset {
                    origin: Origin::Local,
                } => {
                    // Peers reset with their own start player; the state fixes that up.
                    self.send(&ClientMessage::NewGame);
                    self.publish_state();
                }
                GameEvent::Undone => self.publish_state(),
                _ => {}
            }
            self.events.push(event);
        }
    }

    fn send(&mut self, msg: &ClientMessage) {
        if self.status == ConnectionStatus::Disconnected {
            return;
        }
        if self.client_id.is_none() && !matches!(msg, ClientMessage::Join { .. }) {
            return;
        }
        match msg.to_json() {
            Ok(frame) => self.transport.send(frame),
            Err(e) => warn!("failed to encode message: {e}"),
        }
    }
}
