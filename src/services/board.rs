//! Board service: ownership-scoped CRUD and the board detail snapshot.
//!
//! DESIGN
//! ======
//! Every query filters on `boards.user_id`, so a board owned by someone else
//! is indistinguishable from one that does not exist. Child services (notes,
//! areas) go through [`claim_board`] / [`touch_board`] inside their own
//! transaction, which both proves ownership and bumps `updated_at` so the
//! board list reflects child activity.

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::services::area::AreaRow;
use crate::services::note::NoteRow;
use crate::services::validation::{ValidationErrors, require_text};

pub const MAX_TITLE_CHARS: usize = 255;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("board not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Board summary as listed and returned from create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct BoardRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Board plus every note and area on it.
#[derive(Debug, Clone, Serialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: BoardRow,
    pub sticky_notes: Vec<NoteRow>,
    pub areas: Vec<AreaRow>,
}

/// Create/update payload. Fields are optional so missing ones become field errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardInput {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBoard {
    pub title: String,
    pub description: Option<String>,
}

impl BoardInput {
    /// Check required fields; blank descriptions are stored as `NULL`.
    ///
    /// # Errors
    ///
    /// Returns field errors when the title is missing, blank or too long.
    pub fn validate(self) -> Result<ValidBoard, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = self.title.unwrap_or_default();
        require_text(&mut errors, "title", "タイトル", &title, MAX_TITLE_CHARS);
        errors.finish()?;

        let description = self.description.filter(|d| !d.trim().is_empty());
        Ok(ValidBoard { title: title.trim().to_owned(), description })
    }
}

// =============================================================================
// CRUD
// =============================================================================

/// List the user's boards, most recently touched first.
pub async fn list_boards(pool: &PgPool, user_id: Uuid) -> Result<Vec<BoardRow>, BoardError> {
    let rows = sqlx::query_as::<_, BoardRow>(
        "SELECT id, title, description, updated_at
         FROM boards
         WHERE user_id = $1
         ORDER BY updated_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch one board with its notes and areas.
pub async fn get_board_detail(pool: &PgPool, user_id: Uuid, board_id: Uuid) -> Result<BoardDetail, BoardError> {
    let board = sqlx::query_as::<_, BoardRow>(
        "SELECT id, title, description, updated_at FROM boards WHERE id = $1 AND user_id = $2",
    )
    .bind(board_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(BoardError::NotFound(board_id))?;

    let sticky_notes = sqlx::query_as::<_, NoteRow>(
        "SELECT id, board_id, content, color, due_at, notified_at, x, y, width, height
         FROM sticky_notes
         WHERE board_id = $1
         ORDER BY created_at, id",
    )
    .bind(board_id)
    .fetch_all(pool)
    .await?;

    let areas = sqlx::query_as::<_, AreaRow>(
        "SELECT id, board_id, title, x, y, width, height
         FROM board_areas
         WHERE board_id = $1
         ORDER BY created_at, id",
    )
    .bind(board_id)
    .fetch_all(pool)
    .await?;

    Ok(BoardDetail { board, sticky_notes, areas })
}

/// Create a board owned by `user_id`.
pub async fn create_board(pool: &PgPool, user_id: Uuid, input: BoardInput) -> Result<BoardRow, BoardError> {
    let valid = input.validate()?;
    let row = sqlx::query_as::<_, BoardRow>(
        "INSERT INTO boards (user_id, title, description)
         VALUES ($1, $2, $3)
         RETURNING id, title, description, updated_at",
    )
    .bind(user_id)
    .bind(&valid.title)
    .bind(&valid.description)
    .fetch_one(pool)
    .await?;
    tracing::info!(board_id = %row.id, %user_id, "board created");
    Ok(row)
}

/// Replace a board's title and description.
pub async fn update_board(pool: &PgPool, user_id: Uuid, board_id: Uuid, input: BoardInput) -> Result<BoardRow, BoardError> {
    let valid = input.validate()?;
    sqlx::query_as::<_, BoardRow>(
        "UPDATE boards
         SET title = $3, description = $4, updated_at = now()
         WHERE id = $1 AND user_id = $2
         RETURNING id, title, description, updated_at",
    )
    .bind(board_id)
    .bind(user_id)
    .bind(&valid.title)
    .bind(&valid.description)
    .fetch_optional(pool)
    .await?
    .ok_or(BoardError::NotFound(board_id))
}

/// Delete a board; notes, areas and notifications cascade.
pub async fn delete_board(pool: &PgPool, user_id: Uuid, board_id: Uuid) -> Result<(), BoardError> {
    let result = sqlx::query("DELETE FROM boards WHERE id = $1 AND user_id = $2")
        .bind(board_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(BoardError::NotFound(board_id));
    }
    tracing::info!(%board_id, %user_id, "board deleted");
    Ok(())
}

// =============================================================================
// CHILD HELPERS
// =============================================================================

/// Prove `user_id` owns `board_id` and bump its `updated_at`, locking the
/// board row for the rest of the caller's transaction. Returns false when the
/// board is missing or owned by someone else.
pub(crate) async fn claim_board(conn: &mut PgConnection, user_id: Uuid, board_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE boards SET updated_at = now() WHERE id = $1 AND user_id = $2")
        .bind(board_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Bump `updated_at` on a board whose ownership was already checked.
pub(crate) async fn touch_board(conn: &mut PgConnection, board_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE boards SET updated_at = now() WHERE id = $1")
        .bind(board_id)
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
