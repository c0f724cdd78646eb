//! Property routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use casa_engine::PropertyFields;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{self, CreatedResponse, PropertyResponse};
use crate::AppState;

/// Create property routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/properties", post(create_property))
        .route("/properties/{id}", get(get_property).put(update_property))
}

/// GET /properties/{id} - A listing with its media.
async fn get_property(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PropertyResponse>> {
    Ok(Json(handlers::get_property(&state, &id).await?))
}

/// POST /properties - Create a listing.
async fn create_property(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(fields): Json<PropertyFields>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let created = handlers::create_property(&state, fields).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /properties/{id} - Overwrite a listing's fields.
async fn update_property(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Json(fields): Json<PropertyFields>,
) -> Result<StatusCode> {
    handlers::update_property(&state, &id, fields).await?;
    Ok(StatusCode::NO_CONTENT)
}
