use std::collections::HashMap;

use log::{debug, info, warn};
use serde_json::Value;

use crate::protocol::{JoinMode, RELAYED_TYPES, ServerMessage};
use crate::relay::room::{ConnectionId, Room};

/// Outgoing half of one client connection.
pub trait Peer {
    fn is_open(&self) -> bool;
    /// Fire-and-forget delivery of one text frame.
    fn deliver(&self, frame: &str);
}

struct Connection<P> {
    peer: P,
    room: Option<String>,
}

/// Room registry and broadcast logic.
///
/// The hub is driven by one caller at a time; each frame is fully handled
/// (lookup, mutation, broadcast) before the next one, so it needs no locks.
pub struct RelayHub<P: Peer> {
    rooms: HashMap<String, Room>,
    connections: HashMap<ConnectionId, Connection<P>>,
    next_id: u64,
    default_room: String,
}

impl<P: Peer> RelayHub<P> {
    pub fn new(default_room: impl Into<String>) -> Self {
        Self {
            rooms: HashMap::new(),
            connections: HashMap::new(),
            next_id: 1,
            default_room: default_room.into(),
        }
    }

    pub fn connect(&mut self, peer: P) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.connections.insert(id, Connection { peer, room: None });
        debug!("connection {id} opened");
        id
    }

    /// Handles one inbound text frame. Unparseable frames and unknown types
    /// are dropped.
    pub fn handle_frame(&mut self, id: ConnectionId, raw: &str) {
        if !self.connections.contains_key(&id) {
            return;
        }
        let Ok(Value::Object(mut msg)) = serde_json::from_str::<Value>(raw) else {
            debug!("connection {id}: dropping malformed frame");
            return;
        };
        let Some(kind) = msg.get("type").and_then(Value::as_str).map(str::to_owned) else {
            return;
        };

        if kind == "join" {
            let room_id = string_field(&msg, "roomId").unwrap_or_else(|| self.default_room.clone());
            let name = string_field(&msg, "name").unwrap_or_else(|| format!("Player-{id}"));
            let mode = match msg.get("mode").and_then(Value::as_str) {
                Some("spectator") => JoinMode::Spectator,
                _ => JoinMode::Player,
            };
            self.join(id, room_id, name, mode);
            return;
        }

        let Some(room_id) = self.room_of(id) else {
            return;
        };
        if !RELAYED_TYPES.contains(&kind.as_str()) {
            debug!("connection {id}: ignoring message type {kind:?}");
            return;
        }

        msg.insert("senderId".to_string(), Value::String(id.to_string()));
        let frame = Value::Object(msg).to_string();
        self.broadcast_frame(&room_id, &frame, Some(id));
    }

    /// Removes the connection, notifies its room and drops the room once empty.
    pub fn disconnect(&mut self, id: ConnectionId) {
        self.leave_room(id);
        self.connections.remove(&id);
        debug!("connection {id} closed");
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn room_of(&self, id: ConnectionId) -> Option<String> {
        self.connections.get(&id).and_then(|c| c.room.clone())
    }

    fn join(&mut self, id: ConnectionId, room_id: String, name: String, mode: JoinMode) {
        if self.room_of(id).is_some() {
            self.leave_room(id);
        }

        let room = self.rooms.entry(room_id.clone()).or_default();
        let role = room.assign_role(mode);
        room.insert(id, name.clone(), role);
        let (players, spectators) = room.roster();
        let ready = role.is_player() && room.player_count() == 2;
        if let Some(conn) = self.connections.get_mut(&id) {
            conn.room = Some(room_id.clone());
        }
        info!("{name} ({id}) joined room {room_id:?} as {role:?}");

        self.send_to(
            id,
            &ServerMessage::Joined {
                room_id: room_id.clone(),
                client_id: id.to_string(),
                role,
                players: players.clone(),
                spectators: spectators.clone(),
            },
        );
        self.broadcast(&room_id, &ServerMessage::Presence { players, spectators }, Some(id));
        if ready {
            self.broadcast(&room_id, &ServerMessage::Ready, None);
        }
    }

    fn leave_room(&mut self, id: ConnectionId) {
        let Some(room_id) = self
            .connections
            .get_mut(&id)
            .and_then(|conn| conn.room.take())
        else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };

        let role = room.remove(id).map(|member| member.role);
        let empty = room.is_empty();
        info!("connection {id} left room {room_id:?}");

        self.broadcast(
            &room_id,
            &ServerMessage::OpponentLeft {
                id: id.to_string(),
                role,
            },
            None,
        );
        if empty {
            self.rooms.remove(&room_id);
            debug!("room {room_id:?} removed");
        }
    }

    fn send_to(&self, id: ConnectionId, msg: &ServerMessage) {
        let Some(frame) = encode(msg) else {
            return;
        };
        if let Some(conn) = self.connections.get(&id)
            && conn.peer.is_open()
        {
            conn.peer.deliver(&frame);
        }
    }

    fn broadcast(&self, room_id: &str, msg: &ServerMessage, except: Option<ConnectionId>) {
        if let Some(frame) = encode(msg) {
            self.broadcast_frame(room_id, &frame, except);
        }
    }

    fn broadcast_frame(&self, room_id: &str, frame: &str, except: Option<ConnectionId>) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        for member in room.ids().filter(|&member| Some(member) != except) {
            if let Some(conn) = self.connections.get(&member)
                && conn.peer.is_open()
            {
                conn.peer.deliver(frame);
            }
        }
    }
}

fn encode(msg: &ServerMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!("failed to encode relay message: {e}");
            None
        }
    }
}

/// Reads a loosely typed string field; numbers and booleans are stringified,
/// empty strings and null count as absent.
fn string_field(msg: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match msg.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}
