//! Property handlers - read and write listings outside of a session.

use casa_engine::{Gallery, GallerySnapshot, MediaRepository, PropertyFields};
use serde::Serialize;

use crate::db::{self, PgMediaRepository};
use crate::error::{AppError, Result};
use crate::AppState;

/// A listing with its media.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    pub id: String,
    pub fields: PropertyFields,
    pub media: GallerySnapshot,
}

/// Response for a created property.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub id: String,
}

/// Fetch a listing and its media.
pub async fn get_property(state: &AppState, id: &str) -> Result<PropertyResponse> {
    let stored = db::get_property(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("property {}", id)))?;

    let records = PgMediaRepository::new(state.pool.clone())
        .list(&stored.id)
        .await?;
    let gallery = Gallery::from_records(Some(stored.id.clone()), records);
    if let Err(e) = gallery.check_invariants() {
        tracing::warn!(property_id = %stored.id, "stored media breaks an invariant: {}", e);
    }

    Ok(PropertyResponse {
        fields: stored.to_fields(),
        media: gallery.export_state(),
        id: stored.id,
    })
}

/// Create a listing without media.
pub async fn create_property(state: &AppState, fields: PropertyFields) -> Result<CreatedResponse> {
    if !fields.is_saveable() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    let id = db::insert_property(&state.pool, &fields).await?;
    Ok(CreatedResponse { id })
}

/// Overwrite the fields of a listing.
pub async fn update_property(state: &AppState, id: &str, fields: PropertyFields) -> Result<()> {
    if !fields.is_saveable() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    if !db::update_property(&state.pool, id, &fields).await? {
        return Err(AppError::NotFound(format!("property {}", id)));
    }
    tracing::info!(property_id = %id, "property updated");
    Ok(())
}
