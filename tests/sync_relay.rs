//! Sync clients talking through the relay hub over in-memory queues.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use othello_sync::config::ControllerConfig;
use othello_sync::protocol::{JoinMode, Role};
use othello_sync::relay::{ConnectionId, Peer, RelayHub};
use othello_sync::sync::{ConnectionStatus, SessionConfig};
use othello_sync::types::{Difficulty, Player};
use othello_sync::{GameController, SyncClient, Transport};
use web_time::Instant;

type Queue = Rc<RefCell<VecDeque<String>>>;

struct Inbox(Queue);

impl Peer for Inbox {
    fn is_open(&self) -> bool {
        true
    }

    fn deliver(&self, frame: &str) {
        self.0.borrow_mut().push_back(frame.to_string());
    }
}

struct Outbox(Queue);

impl Transport for Outbox {
    fn send(&mut self, frame: String) {
        self.0.borrow_mut().push_back(frame);
    }
}

struct Node {
    id: ConnectionId,
    client: SyncClient<Outbox>,
    outgoing: Queue,
    incoming: Queue,
}

struct Network {
    hub: RelayHub<Inbox>,
    nodes: Vec<Node>,
    now: Instant,
}

impl Network {
    fn new() -> Self {
        Self {
            hub: RelayHub::new("default"),
            nodes: Vec::new(),
            now: Instant::now(),
        }
    }

    fn join(&mut self, name: &str, mode: JoinMode) -> usize {
        self.join_with(name, mode, ControllerConfig::immediate())
    }

    fn join_with(&mut self, name: &str, mode: JoinMode, config: ControllerConfig) -> usize {
        let outgoing = Queue::default();
        let incoming = Queue::default();
        let id = self.hub.connect(Inbox(incoming.clone()));
        let session = SessionConfig {
            room_id: "table".into(),
            name: name.into(),
            mode,
        };
        let mut client =
            SyncClient::new(GameController::new(config), Outbox(outgoing.clone()), session);
        client.on_open();
        self.nodes.push(Node {
            id,
            client,
            outgoing,
            incoming,
        });
        self.pump();
        self.nodes.len() - 1
    }

    fn leave(&mut self, idx: usize) {
        self.hub.disconnect(self.nodes[idx].id);
        self.nodes[idx].client.on_close();
        self.pump();
    }

    fn client(&mut self, idx: usize) -> &mut SyncClient<Outbox> {
        &mut self.nodes[idx].client
    }

    /// Delivers queued frames until every queue is empty.
    fn pump(&mut self) {
        let Network { hub, nodes, now } = self;
        loop {
            let mut progressed = false;
            for node in nodes.iter() {
                loop {
                    let frame = node.outgoing.borrow_mut().pop_front();
                    let Some(frame) = frame else { break };
                    hub.handle_frame(node.id, &frame);
                    progressed = true;
                }
            }
            for node in nodes.iter_mut() {
                loop {
                    let frame = node.incoming.borrow_mut().pop_front();
                    let Some(frame) = frame else { break };
                    node.client.on_message(&frame, *now);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }
}

fn two_players() -> (Network, usize, usize) {
    let mut net = Network::new();
    let a = net.join("ann", JoinMode::Player);
    let b = net.join("bob", JoinMode::Player);
    (net, a, b)
}

#[test]
fn players_get_seats_and_become_ready() {
    let (mut net, a, b) = two_players();

    assert_eq!(net.client(a).role(), Some(Role::Player1));
    assert_eq!(net.client(b).role(), Some(Role::Player2));
    assert_eq!(net.client(a).status(), ConnectionStatus::Ready);
    assert_eq!(net.client(b).status(), ConnectionStatus::Ready);
    assert_eq!(net.client(b).room_id(), Some("table"));
}

#[test]
fn moves_propagate_and_states_converge() {
    let (mut net, a, b) = two_players();
    let now = net.now;

    net.client(a).play(2, 3, now).unwrap();
    net.pump();
    net.client(b).play(2, 2, now).unwrap();
    net.pump();

    let expected = net.client(a).state().clone();
    assert_eq!(expected.move_history.len(), 2);
    assert_eq!(net.client(b).state(), &expected);
    assert_eq!(expected.board.count(), (3, 3));
}

#[test]
fn self_echo_is_not_applied_twice() {
    let (mut net, a, _) = two_players();
    let now = net.now;
    net.client(a).play(2, 3, now).unwrap();
    net.pump();
    let own_id = net.client(a).client_id().unwrap().to_string();
    let before = net.client(a).state().clone();

    let echo = format!(r#"{{"type":"move","row":2,"col":3,"senderId":"{own_id}"}}"#);
    net.client(a).on_message(&echo, now);

    assert_eq!(net.client(a).state(), &before);
    assert_eq!(net.client(a).state().move_history.len(), 1);
}

#[test]
fn third_joiner_spectates_and_freed_seat_is_reused() {
    let (mut net, a, b) = two_players();
    let c = net.join("cat", JoinMode::Player);

    assert_eq!(net.client(c).role(), Some(Role::Spectator));
    assert_eq!(net.client(a).spectators().len(), 1);

    net.leave(a);

    assert_eq!(net.client(b).status(), ConnectionStatus::OpponentLeft);
    assert_eq!(net.client(b).players().len(), 1);
    let d = net.join("dan", JoinMode::Player);
    assert_eq!(net.client(d).role(), Some(Role::Player1));
    assert_eq!(net.client(b).status(), ConnectionStatus::Ready);
    assert_eq!(net.client(c).role(), Some(Role::Spectator));
}

#[test]
fn late_spectator_catches_up_from_player_one() {
    let (mut net, a, b) = two_players();
    let now = net.now;
    net.client(a).play(2, 3, now).unwrap();
    net.pump();
    net.client(b).play(2, 2, now).unwrap();
    net.pump();

    let s = net.join("sue", JoinMode::Spectator);

    let expected = net.client(a).state().clone();
    assert_eq!(net.client(s).state(), &expected);
    assert_eq!(net.client(s).game().undo_depth(), 0);
    assert_eq!(net.client(b).state(), &expected);
}

#[test]
fn undo_is_mirrored_through_state() {
    let (mut net, a, b) = two_players();
    let now = net.now;
    net.client(a).play(2, 3, now).unwrap();
    net.pump();

    assert!(net.client(a).undo(now));
    net.pump();

    let expected = net.client(a).state().clone();
    assert!(expected.move_history.is_empty());
    assert_eq!(net.client(b).state(), &expected);
}

#[test]
fn new_game_with_other_start_player_converges() {
    let (mut net, a, b) = two_players();
    let now = net.now;
    net.client(a).play(2, 3, now).unwrap();
    net.pump();

    net.client(a).new_game(Some(Player::White), now);
    net.pump();

    let expected = net.client(a).state().clone();
    assert_eq!(expected.current_player, Player::White);
    assert!(expected.move_history.is_empty());
    assert_eq!(net.client(b).state(), &expected);
}

#[test]
fn computer_moves_are_published() {
    let mut net = Network::new();
    let a = net.join_with(
        "ann",
        JoinMode::Player,
        ControllerConfig::immediate().with_ai(Some(Player::White), Difficulty::Normal),
    );
    let b = net.join("bob", JoinMode::Player);
    let now = net.now;

    net.client(a).play(2, 3, now).unwrap();
    net.client(a).advance(now);
    net.pump();

    let expected = net.client(a).state().clone();
    assert_eq!(expected.move_history.len(), 2);
    assert_eq!(expected.current_player, Player::Black);
    assert_eq!(net.client(b).state(), &expected);
}

#[test]
fn chat_reaches_the_other_player() {
    let (mut net, a, b) = two_players();

    net.client(a).send_chat("good luck");
    net.pump();
    let a_id = net.client(a).client_id().map(str::to_owned);

    let log = net.client(b).chat_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].text, "good luck");
    assert_eq!(log[0].sender_id, a_id);
}

#[test]
fn garbage_from_a_client_changes_nothing() {
    let (mut net, a, b) = two_players();
    let before = net.client(b).state().clone();

    net.nodes[a]
        .outgoing
        .borrow_mut()
        .push_back("definitely not json".to_string());
    net.pump();

    assert_eq!(net.client(b).state(), &before);
    assert_eq!(net.client(b).status(), ConnectionStatus::Ready);
}

#[test]
fn room_is_dropped_after_everyone_leaves() {
    let (mut net, a, b) = two_players();

    net.leave(a);
    net.leave(b);

    assert_eq!(net.hub.room_count(), 0);
}
