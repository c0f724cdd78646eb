//! Session handlers - open, edit and save property drafts.
//!
//! Each mutation locks the session, runs the engine action, and announces
//! the change to realtime followers of the property when it went through.

use casa_engine::{
    AttachSummary, MediaKind, MediaSession, PropertyFields, ReconcileResult, UploadFile,
    UploadSummary,
};
use serde::{Deserialize, Serialize};

use crate::db::{self, PgMediaRepository};
use crate::error::{AppError, Result};
use crate::sessions::{EditingSession, SessionHandle, SessionManager, SessionView};
use crate::websocket::MediaAction;
use crate::AppState;

/// Request body for opening a session.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    /// Saved property to edit; omitted for a new draft
    #[serde(default)]
    pub property_id: Option<String>,
}

/// Response for an upload batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub summary: UploadSummary,
    pub session: SessionView,
}

/// Request body for moving a record.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

/// Request body naming an image by position.
#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub index: usize,
}

/// Response for a featured toggle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedResponse {
    pub featured: bool,
    pub session: SessionView,
}

/// Response for a refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub result: ReconcileResult,
    pub session: SessionView,
}

/// Request body for saving a draft.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    /// Replacement fields; the session's current fields are saved if absent
    #[serde(default)]
    pub fields: Option<PropertyFields>,
}

/// Response for a save.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub property_id: String,
    /// Whether the save created the property
    pub created: bool,
    /// Local media bound to the property by this save
    pub attach: AttachSummary,
    pub session: SessionView,
}

fn find_session(state: &AppState, session_id: &str) -> Result<SessionHandle> {
    state
        .sessions
        .get(session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {}", session_id)))
}

fn announce(state: &AppState, session: &EditingSession, action: MediaAction) {
    if let Some(property_id) = session.property_id() {
        let sent = state.realtime.media_changed(property_id, &session.id, action);
        tracing::debug!(
            session_id = %session.id,
            property_id = %property_id,
            action = ?action,
            followers = sent,
            "media change announced"
        );
    }
}

/// Open a session on a saved property or a new draft.
pub async fn open_session(state: &AppState, request: OpenSessionRequest) -> Result<SessionView> {
    let (property_id, fields) = match request.property_id {
        Some(id) => {
            let stored = db::get_property(&state.pool, &id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("property {}", id)))?;
            (Some(stored.id.clone()), stored.to_fields())
        }
        None => (None, PropertyFields::default()),
    };

    let media = MediaSession::open(
        property_id,
        PgMediaRepository::new(state.pool.clone()),
        state.blobs.clone(),
    )
    .await?;

    let handle = state.sessions.insert(EditingSession::new(
        SessionManager::next_id(),
        fields,
        media,
    ));
    let mut session = handle.lock().await;
    Ok(session.view())
}

/// Current state of a session.
pub async fn get_session(state: &AppState, session_id: &str) -> Result<SessionView> {
    let handle = find_session(state, session_id)?;
    let mut session = handle.lock().await;
    Ok(session.view())
}

/// Discard a session.
pub async fn close_session(state: &AppState, session_id: &str) -> Result<()> {
    if !state.sessions.remove(session_id) {
        return Err(AppError::NotFound(format!("session {}", session_id)));
    }
    Ok(())
}

/// Upload a batch of files into one collection.
pub async fn upload_media(
    state: &AppState,
    session_id: &str,
    kind: MediaKind,
    files: Vec<UploadFile>,
) -> Result<UploadResponse> {
    let handle = find_session(state, session_id)?;
    let mut session = handle.lock().await;

    let summary = session.media.upload(kind, files).await;
    if !summary.added.is_empty() {
        announce(state, &session, MediaAction::Uploaded);
    }

    Ok(UploadResponse {
        summary,
        session: session.view(),
    })
}

/// Remove the record at `index`.
pub async fn remove_media(
    state: &AppState,
    session_id: &str,
    kind: MediaKind,
    index: usize,
) -> Result<SessionView> {
    let handle = find_session(state, session_id)?;
    let mut session = handle.lock().await;

    session.media.remove(kind, index).await?;
    announce(state, &session, MediaAction::Removed);
    Ok(session.view())
}

/// Move a record within its collection.
pub async fn reorder_media(
    state: &AppState,
    session_id: &str,
    kind: MediaKind,
    request: ReorderRequest,
) -> Result<SessionView> {
    let handle = find_session(state, session_id)?;
    let mut session = handle.lock().await;

    session
        .media
        .reorder(kind, request.from, request.to)
        .await?;
    if request.from != request.to {
        announce(state, &session, MediaAction::Reordered);
    }
    Ok(session.view())
}

/// Make an image the main image.
pub async fn set_main_image(
    state: &AppState,
    session_id: &str,
    request: IndexRequest,
) -> Result<SessionView> {
    let handle = find_session(state, session_id)?;
    let mut session = handle.lock().await;

    session.media.set_main(request.index).await?;
    announce(state, &session, MediaAction::MainChanged);
    Ok(session.view())
}

/// Flip the featured flag of an image.
pub async fn toggle_featured(
    state: &AppState,
    session_id: &str,
    request: IndexRequest,
) -> Result<FeaturedResponse> {
    let handle = find_session(state, session_id)?;
    let mut session = handle.lock().await;

    let featured = session.media.toggle_featured(request.index).await?;
    announce(state, &session, MediaAction::FeaturedChanged);
    Ok(FeaturedResponse {
        featured,
        session: session.view(),
    })
}

/// Merge the stored media listing into the session.
pub async fn refresh_session(state: &AppState, session_id: &str) -> Result<RefreshResponse> {
    let handle = find_session(state, session_id)?;
    let mut session = handle.lock().await;

    let result = session.media.refresh().await?;
    Ok(RefreshResponse {
        result,
        session: session.view(),
    })
}

/// Save the draft fields, creating the property on first save.
///
/// A first save binds every locally held media record to the new property.
/// Later saves retry any record whose earlier attach failed.
pub async fn save_session(
    state: &AppState,
    session_id: &str,
    request: SaveRequest,
) -> Result<SaveResponse> {
    let handle = find_session(state, session_id)?;
    let mut guard = handle.lock().await;
    let session = &mut *guard;

    if let Some(fields) = request.fields {
        session.fields = fields;
    }
    if !session.fields.is_saveable() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }

    let (property_id, created, attach) = match session.property_id().map(str::to_owned) {
        Some(id) => {
            if !db::update_property(&state.pool, &id, &session.fields).await? {
                return Err(AppError::NotFound(format!("property {}", id)));
            }
            let attach = if session.media.has_unattached() {
                session.media.attach_to_property(id.clone()).await
            } else {
                AttachSummary::default()
            };
            (id, false, attach)
        }
        None => {
            let id = db::insert_property(&state.pool, &session.fields).await?;
            let attach = session.media.attach_to_property(id.clone()).await;
            (id, true, attach)
        }
    };

    if !attach.attached.is_empty() {
        announce(state, session, MediaAction::Attached);
    }
    tracing::info!(
        session_id = %session.id,
        property_id = %property_id,
        created,
        attached = attach.attached.len(),
        "draft saved"
    );

    Ok(SaveResponse {
        property_id,
        created,
        attach,
        session: session.view(),
    })
}
