//! WebSocket support for realtime media notifications.
//!
//! Editors viewing a property connect via WebSocket and follow it. When a
//! session changes that property's media, every follower receives a
//! `media_changed` message and can refresh its own session.

mod manager;
mod protocol;

pub use manager::ConnectionManager;
pub use protocol::*;
