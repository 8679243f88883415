use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::relay::hub::{Peer, RelayHub};
use crate::relay::room::ConnectionId;

impl Peer for mpsc::UnboundedSender<String> {
    fn is_open(&self) -> bool {
        !self.is_closed()
    }

    fn deliver(&self, frame: &str) {
        if self.send(frame.to_string()).is_err() {
            debug!("dropping frame for closed connection");
        }
    }
}

enum Event {
    Open {
        peer: mpsc::UnboundedSender<String>,
        reply: oneshot::Sender<ConnectionId>,
    },
    Frame {
        id: ConnectionId,
        text: String,
    },
    Closed {
        id: ConnectionId,
    },
}

/// Binds the configured address and serves until the listener fails.
pub async fn run(config: &RelayConfig) -> Result<(), RelayError> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("relay listening on {}", listener.local_addr()?);
    serve(listener, config.default_room.clone()).await
}

/// Accepts websocket clients on `listener`.
///
/// All room state lives in one dispatch task; every connection task only
/// forwards frames to it, so frames are handled strictly one at a time.
pub async fn serve(listener: TcpListener, default_room: String) -> Result<(), RelayError> {
    let (events, inbox) = mpsc::unbounded_channel();
    tokio::spawn(dispatch(inbox, default_room));

    loop {
        let (stream, addr) = listener.accept().await?;
        let events = events.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, events).await {
                warn!("connection from {addr} failed: {e}");
            }
        });
    }
}

async fn dispatch(mut inbox: mpsc::UnboundedReceiver<Event>, default_room: String) {
    let mut hub = RelayHub::new(default_room);
    while let Some(event) = inbox.recv().await {
        match event {
            Event::Open { peer, reply } => {
                let id = hub.connect(peer);
                if reply.send(id).is_err() {
                    hub.disconnect(id);
                }
            }
            Event::Frame { id, text } => hub.handle_frame(id, &text),
            Event::Closed { id } => hub.disconnect(id),
        }
    }
    debug!("relay dispatcher stopped");
}

async fn handle_connection(
    stream: TcpStream,
    events: mpsc::UnboundedSender<Event>,
) -> Result<(), RelayError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();

    let (peer, mut outbox) = mpsc::unbounded_channel::<String>();
    let (reply, assigned) = oneshot::channel();
    events
        .send(Event::Open { peer, reply })
        .map_err(|_| RelayError::DispatcherClosed)?;
    let id = assigned.await.map_err(|_| RelayError::DispatcherClosed)?;

    // Ends once the hub drops this connection's sender.
    tokio::spawn(async move {
        while let Some(frame) = outbox.recv().await {
            if let Err(e) = sink.send(Message::Text(frame)).await {
                debug!("connection {id}: send failed: {e}");
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(msg) = source.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    debug!("connection {id}: dropping non-UTF-8 binary frame");
                    continue;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("connection {id}: read failed: {e}");
                break;
            }
        };
        if events.send(Event::Frame { id, text }).is_err() {
            return Err(RelayError::DispatcherClosed);
        }
    }

    events
        .send(Event::Closed { id })
        .map_err(|_| RelayError::DispatcherClosed)
}
