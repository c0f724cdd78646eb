//! Realtime WebSocket route.

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::handlers::handle_websocket_connection;
use crate::AppState;

/// Query parameters for the WebSocket upgrade.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeQuery {
    /// Property to follow from the start
    pub property_id: Option<String>,
}

/// Create realtime routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(upgrade))
}

/// GET /ws?propertyId=... - Open a realtime connection.
async fn upgrade(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<RealtimeQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let realtime = state.realtime.clone();
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, realtime, query.property_id))
}
