//! WebSocket message protocol definitions.
//!
//! All messages are JSON-encoded and use snake_case for field names.

use serde::{Deserialize, Serialize};

/// Messages sent from client to server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving changes for a property.
    Subscribe {
        property_id: String,
        /// Request ID for correlating responses
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Stop receiving changes for a property.
    Unsubscribe {
        property_id: String,
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Keep-alive ping.
    Ping,
}

/// What happened to a property's media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaAction {
    Uploaded,
    Removed,
    MainChanged,
    FeaturedChanged,
    Reordered,
    Attached,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms a subscription change.
    Subscribed {
        property_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    Unsubscribed {
        property_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// A session changed the media of a property.
    /// Subscribers other than the originating session should refresh.
    MediaChanged {
        property_id: String,
        /// Session that made the change
        session_id: String,
        action: MediaAction,
    },

    /// Response to ping.
    Pong,

    /// Error message.
    Error {
        /// Error description
        message: String,
        /// Request ID from the original request (if applicable)
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl ServerMessage {
    /// Create an error message.
    pub fn error(message: impl Into<String>, request_id: Option<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            request_id,
        }
    }

    /// Create a media_changed notification.
    pub fn media_changed(
        property_id: impl Into<String>,
        session_id: impl Into<String>,
        action: MediaAction,
    ) -> Self {
        ServerMessage::MediaChanged {
            property_id: property_id.into(),
            session_id: session_id.into(),
            action,
        }
    }
}
