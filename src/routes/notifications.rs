//! Notification feed routes.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use uuid::Uuid;

use crate::routes::ApiError;
use crate::routes::auth::AuthUser;
use crate::services::notification::{self, NotificationDto, NotificationError, NotificationPage, PageQuery};
use crate::state::AppState;

pub(crate) fn notification_error(err: NotificationError) -> ApiError {
    match err {
        NotificationError::NotFound(_) => ApiError::NotFound,
        NotificationError::Database(e) => ApiError::internal("notification query failed", e),
    }
}

/// `GET /api/notifications?page=&per_page=`: newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<NotificationPage>, ApiError> {
    let page = notification::list_notifications(&state.pool, auth.user.id, query)
        .await
        .map_err(notification_error)?;
    Ok(Json(page))
}

/// `PATCH /api/notifications/:id/read`: idempotent.
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<NotificationDto>, ApiError> {
    let dto = notification::mark_read(&state.pool, auth.user.id, notification_id)
        .await
        .map_err(notification_error)?;
    Ok(Json(dto))
}
