//! HTTP route definitions.

mod agenda;
mod health;
mod properties;
mod realtime;
mod sessions;

use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(sessions::routes())
        .merge(properties::routes())
        .merge(agenda::routes())
        .merge(realtime::routes())
}

/// Build the full application: API routes, the public media bucket and the
/// shared middleware stack.
pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .merge(create_routes())
        .nest_service(
            &config.public_object_route(),
            ServeDir::new(config.bucket_dir()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .with_state(state)
}
