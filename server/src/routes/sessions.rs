//! Editing session routes.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use casa_engine::{MediaKind, UploadFile};

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::handlers::{
    self, FeaturedResponse, IndexRequest, OpenSessionRequest, RefreshResponse, ReorderRequest,
    SaveRequest, SaveResponse, UploadResponse,
};
use crate::sessions::SessionView;
use crate::AppState;

/// Create session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{sid}", get(get_session).delete(close_session))
        .route("/sessions/{sid}/media/{kind}", post(upload_media))
        .route("/sessions/{sid}/media/{kind}/order", put(reorder_media))
        .route("/sessions/{sid}/media/{kind}/{index}", delete(remove_media))
        .route("/sessions/{sid}/main", put(set_main_image))
        .route("/sessions/{sid}/featured", post(toggle_featured))
        .route("/sessions/{sid}/refresh", post(refresh_session))
        .route("/sessions/{sid}/save", post(save_session))
}

fn parse_kind(kind: &str) -> Result<MediaKind> {
    MediaKind::parse(kind)
        .ok_or_else(|| AppError::BadRequest(format!("unknown media kind: {}", kind)))
}

/// Collect the file parts of a multipart body. Non-file parts are ignored.
async fn read_files(mut multipart: Multipart) -> Result<Vec<UploadFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("could not read {}: {}", filename, e)))?;

        let file = UploadFile::new(filename, bytes.to_vec());
        files.push(match content_type {
            Some(content_type) => file.with_content_type(content_type),
            None => file,
        });
    }

    Ok(files)
}

/// POST /sessions - Open a session.
async fn open_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<OpenSessionRequest>,
) -> Result<Json<SessionView>> {
    tracing::debug!(anonymous = auth.is_anonymous(), property_id = ?request.property_id, "opening session");
    let view = handlers::open_session(&state, request).await?;
    Ok(Json(view))
}

/// GET /sessions/{sid} - Current session state.
async fn get_session(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(sid): Path<String>,
) -> Result<Json<SessionView>> {
    Ok(Json(handlers::get_session(&state, &sid).await?))
}

/// DELETE /sessions/{sid} - Discard a session.
async fn close_session(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(sid): Path<String>,
) -> Result<StatusCode> {
    handlers::close_session(&state, &sid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /sessions/{sid}/media/{kind} - Upload files.
async fn upload_media(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((sid, kind)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let kind = parse_kind(&kind)?;
    let files = read_files(multipart).await?;
    Ok(Json(handlers::upload_media(&state, &sid, kind, files).await?))
}

/// DELETE /sessions/{sid}/media/{kind}/{index} - Remove a record.
async fn remove_media(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((sid, kind, index)): Path<(String, String, usize)>,
) -> Result<Json<SessionView>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(handlers::remove_media(&state, &sid, kind, index).await?))
}

/// PUT /sessions/{sid}/media/{kind}/order - Move a record.
async fn reorder_media(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((sid, kind)): Path<(String, String)>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<SessionView>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(
        handlers::reorder_media(&state, &sid, kind, request).await?,
    ))
}

/// PUT /sessions/{sid}/main - Choose the main image.
async fn set_main_image(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(sid): Path<String>,
    Json(request): Json<IndexRequest>,
) -> Result<Json<SessionView>> {
    Ok(Json(handlers::set_main_image(&state, &sid, request).await?))
}

/// POST /sessions/{sid}/featured - Toggle a featured image.
async fn toggle_featured(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(sid): Path<String>,
    Json(request): Json<IndexRequest>,
) -> Result<Json<FeaturedResponse>> {
    Ok(Json(handlers::toggle_featured(&state, &sid, request).await?))
}

/// POST /sessions/{sid}/refresh - Merge the stored media listing.
async fn refresh_session(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(sid): Path<String>,
) -> Result<Json<RefreshResponse>> {
    Ok(Json(handlers::refresh_session(&state, &sid).await?))
}

/// POST /sessions/{sid}/save - Save the draft.
async fn save_session(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(sid): Path<String>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>> {
    Ok(Json(handlers::save_session(&state, &sid, request).await?))
}
