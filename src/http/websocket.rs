//! WebSocket endpoint.
//!
//! # Responsibilities
//! - Complete the upgrade handshake and register the connection as a client
//! - Reply to every text frame with `Message received: <text>`
//! - Deregister the client on disconnect
//!
//! # Data Flow
//! ```text
//! registry.broadcast ─┐
//!                     ├─→ outbound queue (mpsc) → writer task → socket
//! reader task (echo) ─┘
//! ```
//!
//! # Design Decisions
//! - One writer per socket; broadcasts and echo replies share its queue
//! - Whichever task finishes first tears the other one down

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::http::server::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(state.client_queue_size);

    let clients = Arc::clone(state.orchestrator.clients());
    let client_id = clients.add_client(Arc::new(tx.clone()));

    let mut writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut reader = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let reply = format!("Message received: {}", text.as_str());
                    if tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(client_id = %client_id, error = %e, "WebSocket read failed");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    clients.remove_client(&client_id);
}
