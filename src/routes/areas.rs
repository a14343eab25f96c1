//! Board area routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::{ApiError, ok_status};
use crate::services::area::{self, AreaError, AreaPatch, AreaRow, CreateArea};
use crate::state::AppState;

pub(crate) fn area_error(err: AreaError) -> ApiError {
    match err {
        AreaError::NotFound(_) | AreaError::BoardNotFound(_) => ApiError::NotFound,
        AreaError::Validation(errors) => ApiError::Validation(errors),
        AreaError::Database(e) => ApiError::internal("area query failed", e),
    }
}

/// `POST /api/boards/:id/areas`
pub async fn create_area(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(board_id): Path<Uuid>,
    Json(body): Json<CreateArea>,
) -> Result<(StatusCode, Json<AreaRow>), ApiError> {
    let row = area::create_area(&state.pool, auth.user.id, board_id, body)
        .await
        .map_err(area_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PUT /api/areas/:id`
pub async fn update_area(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(area_id): Path<Uuid>,
    Json(body): Json<AreaPatch>,
) -> Result<Json<AreaRow>, ApiError> {
    let row = area::update_area(&state.pool, auth.user.id, area_id, body)
        .await
        .map_err(area_error)?;
    Ok(Json(row))
}

/// `DELETE /api/areas/:id`
pub async fn delete_area(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(area_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    area::delete_area(&state.pool, auth.user.id, area_id).await.map_err(area_error)?;
    Ok(ok_status())
}
