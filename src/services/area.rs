//! Board area service. Same ownership scoping as notes, without due dates.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::board;
use crate::services::validation::{ValidationErrors, require_int, require_text};

pub const MAX_AREA_TITLE_CHARS: usize = 255;

const AREA_COLUMNS: &str = "id, board_id, title, x, y, width, height";

#[derive(Debug, thiserror::Error)]
pub enum AreaError {
    #[error("area not found: {0}")]
    NotFound(Uuid),
    #[error("board not found: {0}")]
    BoardNotFound(Uuid),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AreaRow {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateArea {
    pub title: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidArea {
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AreaPatch {
    pub title: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl CreateArea {
    /// # Errors
    ///
    /// Returns field errors for a blank or overlong title or missing geometry.
    pub fn validate(self) -> Result<ValidArea, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = self.title.unwrap_or_default();
        require_text(&mut errors, "title", "タイトル", &title, MAX_AREA_TITLE_CHARS);

        let x = require_int(&mut errors, "x", self.x);
        let y = require_int(&mut errors, "y", self.y);
        let width = require_int(&mut errors, "width", self.width);
        let height = require_int(&mut errors, "height", self.height);

        errors.finish()?;
        Ok(ValidArea { title: title.trim().to_owned(), x, y, width, height })
    }
}

impl AreaPatch {
    /// # Errors
    ///
    /// Returns a field error when a supplied title is blank or too long.
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.title {
            require_text(&mut errors, "title", "タイトル", title, MAX_AREA_TITLE_CHARS);
        }
        errors.finish()?;
        Ok(self)
    }
}

/// Create an area on a board owned by `user_id`.
pub async fn create_area(pool: &PgPool, user_id: Uuid, board_id: Uuid, input: CreateArea) -> Result<AreaRow, AreaError> {
    let area = input.validate()?;

    let mut tx = pool.begin().await?;
    if !board::claim_board(&mut *tx, user_id, board_id).await? {
        return Err(AreaError::BoardNotFound(board_id));
    }
    let row = sqlx::query_as::<_, AreaRow>(&format!(
        "INSERT INTO board_areas (board_id, title, x, y, width, height)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {AREA_COLUMNS}"
    ))
    .bind(board_id)
    .bind(&area.title)
    .bind(area.x)
    .bind(area.y)
    .bind(area.width)
    .bind(area.height)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(area_id = %row.id, %board_id, "area created");
    Ok(row)
}

/// Apply a partial update to an area whose board is owned by `user_id`.
pub async fn update_area(pool: &PgPool, user_id: Uuid, area_id: Uuid, patch: AreaPatch) -> Result<AreaRow, AreaError> {
    let patch = patch.validate()?;

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, AreaRow>(
        "UPDATE board_areas a
         SET title = COALESCE($3, a.title),
             x = COALESCE($4, a.x),
             y = COALESCE($5, a.y),
             width = COALESCE($6, a.width),
             height = COALESCE($7, a.height),
             updated_at = now()
         FROM boards b
         WHERE a.id = $1 AND b.id = a.board_id AND b.user_id = $2
         RETURNING a.id, a.board_id, a.title, a.x, a.y, a.width, a.height",
    )
    .bind(area_id)
    .bind(user_id)
    .bind(&patch.title)
    .bind(patch.x)
    .bind(patch.y)
    .bind(patch.width)
    .bind(patch.height)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AreaError::NotFound(area_id))?;
    board::touch_board(&mut *tx, row.board_id).await?;
    tx.commit().await?;

    Ok(row)
}

/// Delete an area whose board is owned by `user_id`.
pub async fn delete_area(pool: &PgPool, user_id: Uuid, area_id: Uuid) -> Result<(), AreaError> {
    let mut tx = pool.begin().await?;
    let board_id: Uuid = sqlx::query_scalar(
        "DELETE FROM board_areas a
         USING boards b
         WHERE a.id = $1 AND b.id = a.board_id AND b.user_id = $2
         RETURNING a.board_id",
    )
    .bind(area_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AreaError::NotFound(area_id))?;
    board::touch_board(&mut *tx, board_id).await?;
    tx.commit().await?;

    tracing::info!(%area_id, %board_id, "area deleted");
    Ok(())
}

#[cfg(test)]
#[path = "area_test.rs"]
mod tests;
