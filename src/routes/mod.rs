//! Router assembly and the shared API error type.
//!
//! SYSTEM CONTEXT
//! ==============
//! JSON API under `/api`, the Google login flow under `/auth`, processed
//! avatars served as static files under `/storage`, and a `/healthz` probe.
//!
//! ERROR HANDLING
//! ==============
//! Handlers return [`ApiError`]. Ownership failures are reported as 404 so a
//! caller cannot probe for other users' boards. Validation failures carry
//! field messages as `422 {"errors": {...}}`. Database errors are logged here
//! and answered with a bare 500.

pub mod areas;
pub mod auth;
pub mod boards;
pub mod notes;
pub mod notifications;
pub mod profile;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, patch, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::validation::ValidationErrors;
use crate::state::AppState;

/// Multipart overhead allowed on top of the avatar size limit.
const UPLOAD_SLACK_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("unauthenticated")]
    Unauthorized,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    Unavailable(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Log and wrap an unexpected failure.
    pub(crate) fn internal(context: &'static str, err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_owned())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!({ "errors": errors }))).into_response()
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Unavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message).into_response(),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// `{"status": "ok"}` acknowledgement used by delete endpoints.
pub(crate) fn ok_status() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let public_dir = state.config.public_dir();
    let upload_limit = state.config.avatar.max_bytes.saturating_add(UPLOAD_SLACK_BYTES);

    Router::new()
        .route("/auth/google", get(auth::google_redirect))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/api/me", get(auth::me))
        .route("/api/logout", post(auth::logout))
        .route(
            "/api/profile",
            get(profile::show_profile)
                .put(profile::update_profile)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/boards", get(boards::list_boards).post(boards::create_board))
        .route(
            "/api/boards/{id}",
            get(boards::get_board).put(boards::update_board).delete(boards::delete_board),
        )
        .route("/api/boards/{id}/sticky-notes", post(notes::create_note))
        .route("/api/sticky-notes/{id}", put(notes::update_note).delete(notes::delete_note))
        .route("/api/boards/{id}/areas", post(areas::create_area))
        .route("/api/areas/{id}", put(areas::update_area).delete(areas::delete_area))
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/{id}/read", patch(notifications::mark_read))
        .route("/healthz", get(healthz))
        .nest_service("/storage", ServeDir::new(public_dir))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
