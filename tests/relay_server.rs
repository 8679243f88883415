#![cfg(not(target_arch = "wasm32"))]

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_relay() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(othello_sync::relay::server::serve(listener, "default".into()));
    format!("ws://{addr}")
}

async fn connect(url: &str) -> Ws {
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

async fn send(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> Value {
    loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn relays_between_two_websocket_players() {
    let url = start_relay().await;
    let mut a = connect(&url).await;
    let mut b = connect(&url).await;

    send(&mut a, json!({"type": "join", "name": "ann"})).await;
    let joined_a = recv(&mut a).await;
    assert_eq!(joined_a["type"], "joined");
    assert_eq!(joined_a["role"], "player1");
    assert_eq!(joined_a["roomId"], "default");

    send(&mut b, json!({"type": "join", "name": "bob"})).await;
    let joined_b = recv(&mut b).await;
    assert_eq!(joined_b["role"], "player2");
    assert_eq!(recv(&mut a).await["type"], "presence");
    assert_eq!(recv(&mut a).await["type"], "ready");
    assert_eq!(recv(&mut b).await["type"], "ready");

    send(&mut a, json!({"type": "move", "row": 2, "col": 3})).await;
    let relayed = recv(&mut b).await;
    assert_eq!(
        relayed,
        json!({"type": "move", "row": 2, "col": 3, "senderId": joined_a["clientId"]})
    );

    a.close(None).await.unwrap();
    let left = recv(&mut b).await;
    assert_eq!(left["type"], "opponent_left");
    assert_eq!(left["role"], "player1");
}

#[tokio::test]
async fn binary_frames_are_read_as_text() {
    let url = start_relay().await;
    let mut a = connect(&url).await;

    let join = json!({"type": "join", "roomId": "bin"}).to_string();
    a.send(Message::Binary(join.into_bytes())).await.unwrap();

    let joined = recv(&mut a).await;
    assert_eq!(joined["roomId"], "bin");
}
