//! Board routes: list, create, detail, update, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::{ApiError, ok_status};
use crate::services::board::{self, BoardDetail, BoardError, BoardInput, BoardRow};
use crate::state::AppState;

pub(crate) fn board_error(err: BoardError) -> ApiError {
    match err {
        BoardError::NotFound(_) => ApiError::NotFound,
        BoardError::Validation(errors) => ApiError::Validation(errors),
        BoardError::Database(e) => ApiError::internal("board query failed", e),
    }
}

/// `GET /api/boards`: the caller's boards, most recently touched first.
pub async fn list_boards(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<BoardRow>>, ApiError> {
    let rows = board::list_boards(&state.pool, auth.user.id).await.map_err(board_error)?;
    Ok(Json(rows))
}

/// `POST /api/boards`
pub async fn create_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<BoardInput>,
) -> Result<(StatusCode, Json<BoardRow>), ApiError> {
    let row = board::create_board(&state.pool, auth.user.id, body).await.map_err(board_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/boards/:id`: board with its notes and areas.
pub async fn get_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(board_id): Path<Uuid>,
) -> Result<Json<BoardDetail>, ApiError> {
    let detail = board::get_board_detail(&state.pool, auth.user.id, board_id)
        .await
        .map_err(board_error)?;
    Ok(Json(detail))
}

/// `PUT /api/boards/:id`
pub async fn update_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(board_id): Path<Uuid>,
    Json(body): Json<BoardInput>,
) -> Result<Json<BoardRow>, ApiError> {
    let row = board::update_board(&state.pool, auth.user.id, board_id, body)
        .await
        .map_err(board_error)?;
    Ok(Json(row))
}

/// `DELETE /api/boards/:id`: cascades notes, areas and notifications.
pub async fn delete_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(board_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    board::delete_board(&state.pool, auth.user.id, board_id).await.map_err(board_error)?;
    Ok(ok_status())
}
