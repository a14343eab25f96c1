//! Sticky note routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::{ApiError, ok_status};
use crate::services::note::{self, CreateNote, NoteError, NoteRow, UpdateNote};
use crate::state::AppState;

pub(crate) fn note_error(err: NoteError) -> ApiError {
    match err {
        NoteError::NotFound(_) | NoteError::BoardNotFound(_) => ApiError::NotFound,
        NoteError::Validation(errors) => ApiError::Validation(errors),
        NoteError::Database(e) => ApiError::internal("sticky note query failed", e),
    }
}

/// `POST /api/boards/:id/sticky-notes`
pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(board_id): Path<Uuid>,
    Json(body): Json<CreateNote>,
) -> Result<(StatusCode, Json<NoteRow>), ApiError> {
    let row = note::create_note(&state.pool, auth.user.id, board_id, body)
        .await
        .map_err(note_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PUT /api/sticky-notes/:id`: partial update; returns the stored note.
pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<Uuid>,
    Json(body): Json<UpdateNote>,
) -> Result<Json<NoteRow>, ApiError> {
    let row = note::update_note(&state.pool, auth.user.id, note_id, body)
        .await
        .map_err(note_error)?;
    Ok(Json(row))
}

/// `DELETE /api/sticky-notes/:id`
pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    note::delete_note(&state.pool, auth.user.id, note_id).await.map_err(note_error)?;
    Ok(ok_status())
}
