//! WebSocket connection manager.
//!
//! Tracks active WebSocket connections and which properties each one
//! follows, so media changes can be pushed to the editors that care.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::{MediaAction, ServerMessage};

/// Sender for WebSocket messages.
pub type MessageSender = mpsc::UnboundedSender<ServerMessage>;

/// A single WebSocket connection.
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: String,
    /// Properties this connection follows
    pub properties: HashSet<String>,
    /// Channel to send messages to this connection
    pub sender: MessageSender,
}

/// Manages active WebSocket connections.
///
/// Thread-safe and can be shared across handlers via `Arc`.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    /// All active connections, keyed by connection ID.
    connections: DashMap<String, Connection>,
    /// Connection IDs by followed property.
    by_property: DashMap<String, Vec<String>>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new connection manager wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection.
    ///
    /// Returns the connection ID.
    pub fn register(&self, sender: MessageSender) -> String {
        let conn_id = uuid::Uuid::new_v4().to_string();

        self.connections.insert(
            conn_id.clone(),
            Connection {
                id: conn_id.clone(),
                properties: HashSet::new(),
                sender,
            },
        );

        tracing::info!(conn_id = %conn_id, "WebSocket connection registered");
        conn_id
    }

    /// Follow a property. Returns false for unknown connections.
    pub fn subscribe(&self, conn_id: &str, property_id: &str) -> bool {
        let Some(mut conn) = self.connections.get_mut(conn_id) else {
            return false;
        };
        if conn.properties.insert(property_id.to_string()) {
            self.by_property
                .entry(property_id.to_string())
                .or_default()
                .push(conn_id.to_string());
        }
        true
    }

    /// Stop following a property.
    pub fn unsubscribe(&self, conn_id: &str, property_id: &str) {
        if let Some(mut conn) = self.connections.get_mut(conn_id) {
            conn.properties.remove(property_id);
        }
        self.drop_from_index(conn_id, property_id);
    }

    fn drop_from_index(&self, conn_id: &str, property_id: &str) {
        if let Some(mut conn_ids) = self.by_property.get_mut(property_id) {
            conn_ids.retain(|id| id != conn_id);
            if conn_ids.is_empty() {
                drop(conn_ids);
                self.by_property.remove(property_id);
            }
        }
    }

    /// Unregister a connection.
    pub fn unregister(&self, conn_id: &str) {
        if let Some((_, conn)) = self.connections.remove(conn_id) {
            for property_id in &conn.properties {
                self.drop_from_index(conn_id, property_id);
            }
            tracing::info!(
                conn_id = %conn_id,
                followed = conn.properties.len(),
                "WebSocket connection unregistered"
            );
        }
    }

    /// Send a message to every follower of a property.
    ///
    /// Returns the number of connections that received the message.
    pub fn publish(&self, property_id: &str, message: ServerMessage) -> usize {
        let Some(conn_ids) = self.by_property.get(property_id).map(|ids| ids.clone()) else {
            return 0;
        };

        let mut sent_count = 0;
        for conn_id in conn_ids {
            if let Some(conn) = self.connections.get(&conn_id) {
                if conn.sender.send(message.clone()).is_ok() {
                    sent_count += 1;
                }
            }
        }

        tracing::debug!(
            property_id = %property_id,
            recipients = sent_count,
            "Published message to followers"
        );
        sent_count
    }

    /// Announce that a session changed a property's media.
    pub fn media_changed(&self, property_id: &str, session_id: &str, action: MediaAction) -> usize {
        self.publish(
            property_id,
            ServerMessage::media_changed(property_id, session_id, action),
        )
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, conn_id: &str, message: ServerMessage) -> bool {
        if let Some(conn) = self.connections.get(conn_id) {
            conn.sender.send(message).is_ok()
        } else {
            false
        }
    }

    /// Get the number of active connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of connections following a property.
    pub fn follower_count(&self, property_id: &str) -> usize {
        self.by_property
            .get(property_id)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }
}
