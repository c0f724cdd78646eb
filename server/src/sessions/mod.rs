//! Editing sessions.
//!
//! A session holds one property draft: its scalar fields and the media
//! gallery being edited. Sessions live in memory only; closing the browser
//! tab (or calling `DELETE /sessions/{id}`) discards unsaved state.

mod manager;

pub use manager::*;

use casa_engine::{GallerySnapshot, MediaSession, Notice, PropertyFields};
use serde::Serialize;
use std::sync::Arc;

use crate::db::PgMediaRepository;
use crate::storage::DiskBlobStore;

/// Media session wired to the production stores.
pub type PropertyMedia = MediaSession<PgMediaRepository, Arc<DiskBlobStore>>;

/// One open property draft.
pub struct EditingSession {
    pub id: String,
    pub fields: PropertyFields,
    pub media: PropertyMedia,
}

impl EditingSession {
    pub fn new(id: String, fields: PropertyFields, media: PropertyMedia) -> Self {
        Self { id, fields, media }
    }

    pub fn property_id(&self) -> Option<&str> {
        self.media.gallery().property_id()
    }

    /// Current state for the client. Drains queued notices.
    pub fn view(&mut self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            property_id: self.property_id().map(str::to_owned),
            fields: self.fields.clone(),
            gallery: self.media.gallery().export_state(),
            notices: self.media.take_notices(),
        }
    }
}

/// Session state as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub property_id: Option<String>,
    pub fields: PropertyFields,
    pub gallery: GallerySnapshot,
    pub notices: Vec<Notice>,
}
