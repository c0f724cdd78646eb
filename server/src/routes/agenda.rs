//! Agenda and settings routes.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::auth::AuthUser;
use crate::db::AgencySettings;
use crate::error::Result;
use crate::handlers::{self, WeekQuery, WeekResponse};
use crate::AppState;

/// Create agenda routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/agenda/week", get(week))
        .route("/settings", get(settings))
}

/// GET /agenda/week?start=YYYY-MM-DD - Week grid.
async fn week(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeekResponse>> {
    Ok(Json(handlers::week(&state, query).await?))
}

/// GET /settings - Agency settings.
async fn settings(State(state): State<AppState>, _auth: AuthUser) -> Result<Json<AgencySettings>> {
    let settings = state.settings.get(&state.pool).await?;
    Ok(Json(settings.clone()))
}
