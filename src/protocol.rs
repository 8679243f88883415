//! JSON messages exchanged between sync clients and the relay.
//!
//! Every message is an object tagged by `type`. Field names are camelCase on
//! the wire (`roomId`, `clientId`, `senderId`).

use serde::{Deserialize, Serialize};

use crate::types::GameState;

/// Message types the relay stamps with `senderId` and forwards.
pub const RELAYED_TYPES: [&str; 5] = ["move", "pass", "new_game", "state", "chat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player1,
    Player2,
    Spectator,
}

impl Role {
    pub fn is_player(self) -> bool {
        matches!(self, Role::Player1 | Role::Player2)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMode {
    #[default]
    Player,
    Spectator,
}

/// Roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// Client → relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Join {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        mode: JoinMode,
    },
    Move {
        row: u8,
        col: u8,
    },
    Pass,
    NewGame,
    State {
        payload: GameState,
    },
    Chat {
        text: String,
    },
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Relay → client. Relayed game messages carry the `senderId` stamped by
/// the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Joined {
        room_id: String,
        client_id: String,
        role: Role,
        players: Vec<Participant>,
        spectators: Vec<Participant>,
    },
    Presence {
        players: Vec<Participant>,
        spectators: Vec<Participant>,
    },
    Ready,
    OpponentLeft {
        id: String,
        #[serde(default)]
        role: Option<Role>,
    },
    Move {
        row: u8,
        col: u8,
        #[serde(default)]
        sender_id: Option<String>,
    },
    Pass {
        #[serde(default)]
        sender_id: Option<String>,
    },
    NewGame {
        #[serde(default)]
        sender_id: Option<String>,
    },
    State {
        payload: GameState,
        #[serde(default)]
        sender_id: Option<String>,
    },
    Chat {
        text: String,
        #[serde(default)]
        sender_id: Option<String>,
    },
}

impl ServerMessage {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Relay-stamped sender of a relayed game message.
    pub fn sender_id(&self) -> Option<&str> {
        match self {
            ServerMessage::Move { sender_id, .. }
            | ServerMessage::Pass { sender_id }
            | ServerMessage::NewGame { sender_id }
            | ServerMessage::State { sender_id, .. }
            | ServerMessage::Chat { sender_id, .. } => sender_id.as_deref(),
            _ => None,
        }
    }
}
