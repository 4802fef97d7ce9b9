use std::{sync::Arc, time::Duration};

use axum::{
    debug_handler,
    extract::{ws::{Message, WebSocket}, State, WebSocketUpgrade},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::{sync::mpsc, time::Instant};
use tower_sessions::Session;

use crate::{session::USERNAME, AppResult};

use super::{events::{ClientEvent, ServerEvent}, registry::OUTBOUND_CAPACITY, ConnectionId, Relay};

/// How often the server pings a relay client, and how long past the next ping
/// a silent client is tolerated. Any inbound frame counts as a sign of life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
        }
    }
}

#[debug_handler(state = crate::AppState)]
pub async fn relay_ws(
    State(relay): State<Relay>,
    session: Session,

    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    // informational only; clients still pick their identity with `register user`
    let session_user = session.get::<String>(USERNAME).await?;

    Ok(ws.on_upgrade(move |socket| run_connection(socket, relay, session_user)))
}

pub(crate) async fn run_connection(socket: WebSocket, relay: Relay, session_user: Option<String>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Arc<ServerEvent>>(OUTBOUND_CAPACITY);
    let (ping_tx, mut ping_rx) = mpsc::channel::<()>(1);
    let id = relay.registry().connect(tx);

    tracing::info!(
        connection = %id,
        session_user = ?session_user,
        connections = relay.registry().connection_count(),
        "relay connection opened"
    );

    let mut writer = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => match serde_json::to_string(&*event) {
                        Ok(text) => Message::Text(text.into()),
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to encode server event");
                            continue;
                        }
                    },
                    // dropped from the registry
                    None => break,
                },
                Some(()) = ping_rx.recv() => Message::Ping(Default::default()),
            };
            if sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    let heartbeat = relay.heartbeat();
    let mut ticker = tokio::time::interval(heartbeat.interval);
    ticker.tick().await;
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            _ = &mut writer => break,
            _ = ticker.tick() => {
                if last_seen.elapsed() > heartbeat.interval + heartbeat.timeout {
                    tracing::warn!(connection = %id, "relay client stopped answering pings");
                    break;
                }
                // a ping still queued means the writer is stuck; the deadline above covers it
                let _ = ping_tx.try_send(());
            }
            frame = receiver.next() => {
                last_seen = Instant::now();
                match frame {
                    Some(Ok(Message::Text(text))) => handle_frame(&relay, id, text.as_str().as_bytes()).await,
                    Some(Ok(Message::Binary(data))) => handle_frame(&relay, id, &data).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(connection = %id, error = %e, "relay socket error");
                        break;
                    }
                }
            }
        }
    }

    writer.abort();
    let released = relay.registry().disconnect(id);
    tracing::info!(
        connection = %id,
        released = ?released,
        connections = relay.registry().connection_count(),
        "relay connection closed"
    );
}

async fn handle_frame(relay: &Relay, id: ConnectionId, data: &[u8]) {
    match serde_json::from_slice::<ClientEvent>(data) {
        Ok(event) => relay.handle(id, event).await,
        Err(e) => {
            tracing::debug!(connection = %id, error = %e, "undecodable frame");
            relay.reply_error(id, "unknown", format!("invalid event: {e}"));
        }
    }
}
