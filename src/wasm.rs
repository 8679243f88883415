//! Browser bindings: a [`SyncClient`] driven by JavaScript callbacks.

use log::warn;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_time::Instant;

use crate::config::ControllerConfig;
use crate::config::parse_ai_side;
use crate::game::GameController;
use crate::protocol::{JoinMode, Participant, Role};
use crate::sync::{ChatLine, ConnectionStatus, SessionConfig, SyncClient, Transport};
use crate::types::{Difficulty, GameResult, GameState, Player, Position};

/// Forwards outgoing frames to a JS function `(frame: string) => void`.
struct JsTransport {
    send: js_sys::Function,
}

impl Transport for JsTransport {
    fn send(&mut self, frame: String) {
        if let Err(e) = self.send.call1(&JsValue::NULL, &JsValue::from_str(&frame)) {
            warn!("transport send failed: {e:?}");
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct View<'a> {
    state: &'a GameState,
    legal_moves: Vec<Position>,
    history: Vec<String>,
    result: Option<GameResult>,
    can_undo: bool,
    ai_thinking: bool,
    status: ConnectionStatus,
    client_id: Option<&'a str>,
    room_id: Option<&'a str>,
    role: Option<Role>,
    players: &'a [Participant],
    spectators: &'a [Participant],
    chat: &'a [ChatLine],
}

#[wasm_bindgen]
pub struct WasmSession {
    client: SyncClient<JsTransport>,
}

#[wasm_bindgen]
impl WasmSession {
    /// `send` receives every outgoing protocol frame as a string.
    #[wasm_bindgen(constructor)]
    pub fn new(
        send: js_sys::Function,
        room_id: Option<String>,
        name: Option<String>,
        spectator: bool,
    ) -> WasmSession {
        let defaults = SessionConfig::default();
        let session = SessionConfig {
            room_id: room_id.filter(|r| !r.is_empty()).unwrap_or(defaults.room_id),
            name: name.filter(|n| !n.is_empty()).unwrap_or(defaults.name),
            mode: if spectator {
                JoinMode::Spectator
            } else {
                JoinMode::Player
            },
        };
        let game = GameController::new(ControllerConfig::default());
        WasmSession {
            client: SyncClient::new(game, JsTransport { send }, session),
        }
    }

    pub fn on_open(&mut self) {
        self.client.on_open();
    }

    pub fn on_close(&mut self) {
        self.client.on_close();
    }

    pub fn on_message(&mut self, raw: &str) {
        self.client.on_message(raw, Instant::now());
    }

    pub fn play(&mut self, row: u8, col: u8) -> Result<(), JsValue> {
        self.client
            .play(row, col, Instant::now())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn pass(&mut self) -> Result<(), JsValue> {
        self.client
            .pass(Instant::now())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// `start` is `"black"`, `"white"` or absent to keep the current setting.
    pub fn new_game(&mut self, start: Option<String>) -> Result<(), JsValue> {
        let start = start
            .map(|s| s.parse::<Player>())
            .transpose()
            .map_err(|e| JsValue::from_str(&e))?;
        self.client.new_game(start, Instant::now());
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        self.client.undo(Instant::now())
    }

    /// `[row, col]` of the suggested move.
    pub fn hint(&self) -> Option<Vec<u8>> {
        self.client.hint().map(|p| vec![p.row, p.col])
    }

    /// `side`: none/black/white. `difficulty`: easy/normal/hard.
    pub fn set_ai(&mut self, side: &str, difficulty: &str) -> Result<(), JsValue> {
        let side = parse_ai_side(side).map_err(|e| JsValue::from_str(&e))?;
        let difficulty = difficulty
            .parse::<Difficulty>()
            .map_err(|e| JsValue::from_str(&e))?;
        self.client.set_ai(side, difficulty, Instant::now());
        Ok(())
    }

    pub fn send_chat(&mut self, text: String) {
        self.client.send_chat(text);
    }

    /// Runs due timers. Call again after `next_delay_ms`.
    pub fn tick(&mut self) {
        self.client.advance(Instant::now());
    }

    pub fn next_delay_ms(&self) -> Option<f64> {
        self.client
            .next_deadline()
            .map(|at| at.saturating_duration_since(Instant::now()).as_millis() as f64)
    }

    pub fn view(&self) -> Result<JsValue, JsValue> {
        let game = self.client.game();
        let state = game.state();
        let view = View {
            state,
            legal_moves: game.legal_moves(),
            history: state
                .move_history
                .iter()
                .enumerate()
                .map(|(i, entry)| entry.describe(i + 1))
                .collect(),
            result: game.result(),
            can_undo: game.can_undo(),
            ai_thinking: game.is_ai_pending(),
            status: self.client.status(),
            client_id: self.client.client_id(),
            room_id: self.client.room_id(),
            role: self.client.role(),
            players: self.client.players(),
            spectators: self.client.spectators(),
            chat: self.client.chat_log(),
        };
        Ok(serde_wasm_bindgen::to_value(&view)?)
    }

    /// Game events since the last call, for animations and sounds.
    pub fn take_events(&mut self) -> Result<JsValue, JsValue> {
        let events = self.client.take_events();
        Ok(serde_wasm_bindgen::to_value(&events)?)
    }
}
