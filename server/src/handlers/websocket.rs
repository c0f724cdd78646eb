//! WebSocket handler for realtime media notifications.
//!
//! Handles WebSocket connections, follows the properties a client asks
//! for, and forwards `media_changed` messages published by sessions.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::websocket::{ClientMessage, ConnectionManager, ServerMessage};

/// Handle an established WebSocket connection.
///
/// This function:
/// 1. Registers the connection with the manager
/// 2. Follows `initial_property` if one was given in the URL
/// 3. Spawns a task to forward outgoing messages
/// 4. Processes incoming messages in a loop
/// 5. Cleans up on disconnect
pub async fn handle_websocket_connection(
    socket: WebSocket,
    realtime: Arc<ConnectionManager>,
    initial_property: Option<String>,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let conn_id = realtime.register(tx);

    if let Some(property_id) = &initial_property {
        realtime.subscribe(&conn_id, property_id);
    }

    tracing::info!(
        conn_id = %conn_id,
        property_id = ?initial_property,
        "WebSocket client connected"
    );

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                        tracing::warn!("Failed to send WebSocket message: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize WebSocket message: {}", e);
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let response = process_message(&text, &realtime, &conn_id);
                realtime.send_to(&conn_id, response);
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!("Binary messages not supported");
            }
            Ok(Message::Ping(data)) => {
                tracing::trace!("Received ping: {} bytes", data.len());
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!("Received pong");
            }
            Ok(Message::Close(_)) => {
                tracing::info!(conn_id = %conn_id, "WebSocket close frame received");
                break;
            }
            Err(e) => {
                tracing::warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    realtime.unregister(&conn_id);
    send_task.abort();

    tracing::info!(
        conn_id = %conn_id,
        active_connections = realtime.connection_count(),
        "WebSocket client disconnected"
    );
}

/// Process a client message and return a server response.
fn process_message(text: &str, realtime: &ConnectionManager, conn_id: &str) -> ServerMessage {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return ServerMessage::error(format!("Invalid message format: {}", e), None);
        }
    };

    match client_msg {
        ClientMessage::Subscribe {
            property_id,
            request_id,
        } => {
            if !realtime.subscribe(conn_id, &property_id) {
                return ServerMessage::error("connection is closed", request_id);
            }
            ServerMessage::Subscribed {
                property_id,
                request_id,
            }
        }
        ClientMessage::Unsubscribe {
            property_id,
            request_id,
        } => {
            realtime.unsubscribe(conn_id, &property_id);
            ServerMessage::Unsubscribed {
                property_id,
                request_id,
            }
        }
        ClientMessage::Ping => ServerMessage::Pong,
    }
}
