use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use chipledger_protocol::{ClientToServer, ConnectionId, ServerToClient};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broadcast::Outbox;
use crate::config::RulesConfig;
use crate::lobby::Lobby;

/// Shared handle to the lobby. The lock is never held across an `.await`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<Lobby>>,
}

impl AppState {
    pub fn new(rules: RulesConfig) -> Self {
        AppState {
            inner: Arc::new(Mutex::new(Lobby::new(rules))),
        }
    }

    fn connect(&self, connection: ConnectionId, outbox: Outbox) {
        self.inner.lock().connect(connection, outbox);
    }

    fn handle_text(&self, connection: ConnectionId, text: &str) {
        match serde_json::from_str::<ClientToServer>(text) {
            Ok(cmd) => self.inner.lock().handle(connection, cmd),
            Err(e) => {
                debug!(%connection, error = %e, "unparseable frame");
                self.reject(connection);
            }
        }
    }

    fn reject(&self, connection: ConnectionId) {
        self.inner.lock().reject_frame(connection);
    }

    fn disconnect(&self, connection: ConnectionId) {
        self.inner.lock().disconnect(connection);
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx_out, mut rx_out) = tokio::sync::mpsc::unbounded_channel::<ServerToClient>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx_out.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to encode outbound message");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let connection = Uuid::new_v4();
    info!(%connection, "client connected");
    state.connect(connection, tx_out);

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => state.handle_text(connection, &text),
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => state.handle_text(connection, text),
                Err(_) => state.reject(connection),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(%connection, error = %e, "socket error");
                break;
            }
        }
    }

    state.disconnect(connection);
    writer.abort();
    info!(%connection, "client disconnected");
}
