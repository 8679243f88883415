//! Room-based message relay.
//!
//! [`hub::RelayHub`] holds every room and handles one frame at a time;
//! [`server`] feeds it from websocket connections through a single dispatch
//! task.

pub mod hub;
pub mod room;
#[cfg(not(target_arch = "wasm32"))]
pub mod server;

pub use hub::{Peer, RelayHub};
pub use room::{ConnectionId, Member, Room};
