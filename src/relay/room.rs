use std::collections::BTreeMap;
use std::fmt;

use crate::protocol::{JoinMode, Participant, Role};

/// Relay-assigned connection id. Sequential, rendered as a decimal string
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub role: Role,
}

/// Participants of one room, ordered by connection id (join order).
#[derive(Debug, Default)]
pub struct Room {
    members: BTreeMap<ConnectionId, Member>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Role a new joiner would receive: the first vacant player seat unless
    /// spectating was requested or both seats are taken.
    pub fn assign_role(&self, mode: JoinMode) -> Role {
        if mode == JoinMode::Spectator {
            return Role::Spectator;
        }
        if !self.has_role(Role::Player1) {
            Role::Player1
        } else if !self.has_role(Role::Player2) {
            Role::Player2
        } else {
            Role::Spectator
        }
    }

    pub fn insert(&mut self, id: ConnectionId, name: String, role: Role) {
        self.members.insert(id, Member { name, role });
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Member> {
        self.members.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Member> {
        self.members.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.members.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.members.values().filter(|m| m.role.is_player()).count()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.members.values().any(|m| m.role == role)
    }

    /// `(players, spectators)` as sent in `joined` and `presence`.
    pub fn roster(&self) -> (Vec<Participant>, Vec<Participant>) {
        self.members
            .iter()
            .map(|(id, member)| Participant {
                id: id.to_string(),
                name: member.name.clone(),
                role: member.role,
            })
            .partition(|p| p.role.is_player())
    }
}
