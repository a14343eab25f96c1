//! Sticky note service: create, partial update and delete, scoped through
//! the parent board's owner.
//!
//! DESIGN
//! ======
//! Updates run in one transaction: the note row is locked together with an
//! ownership join, the patch is applied in Rust by [`apply_patch`], and the
//! full row is written back. Locking the row keeps a due-date edit and the
//! overdue scan from interleaving, so a re-armed note is never marked
//! notified for its old due date.
//!
//! Re-arm rule: whenever an update sets `due_at`, `notified_at` is cleared if
//! the new due date is absent, in the future, or later than the moment the
//! note was last notified.

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::services::board;
use crate::services::validation::{ValidationErrors, limit_text, require_int};

pub const MAX_COLOR_CHARS: usize = 32;

const NOTE_COLUMNS: &str = "id, board_id, content, color, due_at, notified_at, x, y, width, height";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("sticky note not found: {0}")]
    NotFound(Uuid),
    #[error("board not found: {0}")]
    BoardNotFound(Uuid),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub board_id: Uuid,
    pub content: String,
    pub color: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub notified_at: Option<OffsetDateTime>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Deserialize a field that is present in the payload, even as `null`.
/// Combined with `#[serde(default)]` this separates "absent" from "null".
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Create payload as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNote {
    pub content: Option<String>,
    pub color: Option<String>,
    pub due_at: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNote {
    pub content: String,
    pub color: String,
    pub due_at: Option<OffsetDateTime>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Update payload as received; every field is optional and `due_at: null`
/// clears the due date.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNote {
    pub content: Option<String>,
    pub color: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub due_at: Option<Option<String>>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub content: Option<String>,
    pub color: Option<String>,
    pub due_at: Option<Option<OffsetDateTime>>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

// =============================================================================
// VALIDATION
// =============================================================================

fn check_color(errors: &mut ValidationErrors, color: &str) {
    if color.trim().is_empty() {
        errors.add("color", "色は必須です。");
    } else {
        limit_text(errors, "color", "色", color, MAX_COLOR_CHARS);
    }
}

fn parse_due(errors: &mut ValidationErrors, raw: Option<&str>) -> Option<OffsetDateTime> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(due) => Some(due),
        Err(_) => {
            errors.add("due_at", "期限は有効な日時ではありません。");
            None
        }
    }
}

impl CreateNote {
    /// # Errors
    ///
    /// Returns field errors for a missing content/geometry field, a blank or
    /// overlong color, or an unparseable due date.
    pub fn validate(self) -> Result<ValidNote, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let content = self.content.unwrap_or_else(|| {
            errors.add("content", "内容は必須です。");
            String::new()
        });
        let color = self.color.unwrap_or_default();
        check_color(&mut errors, &color);
        let due_at = parse_due(&mut errors, self.due_at.as_deref());
        let x = require_int(&mut errors, "x", self.x);
        let y = require_int(&mut errors, "y", self.y);
        let width = require_int(&mut errors, "width", self.width);
        let height = require_int(&mut errors, "height", self.height);

        errors.finish()?;
        Ok(ValidNote { content, color, due_at, x, y, width, height })
    }
}

impl UpdateNote {
    /// # Errors
    ///
    /// Returns field errors for a blank or overlong color or an unparseable
    /// due date. Absent fields are never errors.
    pub fn validate(self) -> Result<NotePatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(color) = &self.color {
            check_color(&mut errors, color);
        }
        let due_at = self.due_at.map(|raw| parse_due(&mut errors, raw.as_deref()));

        errors.finish()?;
        Ok(NotePatch {
            content: self.content,
            color: self.color,
            due_at,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        })
    }
}

// =============================================================================
// RE-ARM
// =============================================================================

/// Whether setting `new_due` must clear the notified marker.
#[must_use]
pub fn should_rearm(new_due: Option<OffsetDateTime>, notified_at: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    match new_due {
        None => true,
        Some(due) => due > now || notified_at.is_some_and(|at| due > at),
    }
}

/// Apply a validated patch to a loaded row.
pub fn apply_patch(row: &mut NoteRow, patch: NotePatch, now: OffsetDateTime) {
    if let Some(content) = patch.content {
        row.content = content;
    }
    if let Some(color) = patch.color {
        row.color = color;
    }
    if let Some(due_at) = patch.due_at {
        if should_rearm(due_at, row.notified_at, now) {
            row.notified_at = None;
        }
        row.due_at = due_at;
    }
    if let Some(x) = patch.x {
        row.x = x;
    }
    if let Some(y) = patch.y {
        row.y = y;
    }
    if let Some(width) = patch.width {
        row.width = width;
    }
    if let Some(height) = patch.height {
        row.height = height;
    }
}

// =============================================================================
// CRUD
// =============================================================================

/// Create a note on a board owned by `user_id`.
pub async fn create_note(pool: &PgPool, user_id: Uuid, board_id: Uuid, input: CreateNote) -> Result<NoteRow, NoteError> {
    let note = input.validate()?;

    let mut tx = pool.begin().await?;
    if !board::claim_board(&mut *tx, user_id, board_id).await? {
        return Err(NoteError::BoardNotFound(board_id));
    }
    let row = sqlx::query_as::<_, NoteRow>(&format!(
        "INSERT INTO sticky_notes (board_id, content, color, due_at, x, y, width, height)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {NOTE_COLUMNS}"
    ))
    .bind(board_id)
    .bind(&note.content)
    .bind(&note.color)
    .bind(note.due_at)
    .bind(note.x)
    .bind(note.y)
    .bind(note.width)
    .bind(note.height)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(note_id = %row.id, %board_id, "sticky note created");
    Ok(row)
}

/// Apply a partial update to a note whose board is owned by `user_id`.
pub async fn update_note(pool: &PgPool, user_id: Uuid, note_id: Uuid, input: UpdateNote) -> Result<NoteRow, NoteError> {
    let patch = input.validate()?;

    let mut tx = pool.begin().await?;
    let mut row = sqlx::query_as::<_, NoteRow>(
        "SELECT n.id, n.board_id, n.content, n.color, n.due_at, n.notified_at, n.x, n.y, n.width, n.height
         FROM sticky_notes n
         JOIN boards b ON b.id = n.board_id
         WHERE n.id = $1 AND b.user_id = $2
         FOR UPDATE OF n",
    )
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(NoteError::NotFound(note_id))?;

    let rearmed = patch.due_at.is_some() && row.notified_at.is_some();
    apply_patch(&mut row, patch, OffsetDateTime::now_utc());

    let row = sqlx::query_as::<_, NoteRow>(&format!(
        "UPDATE sticky_notes
         SET content = $2, color = $3, due_at = $4, notified_at = $5,
             x = $6, y = $7, width = $8, height = $9, updated_at = now()
         WHERE id = $1
         RETURNING {NOTE_COLUMNS}"
    ))
    .bind(row.id)
    .bind(&row.content)
    .bind(&row.color)
    .bind(row.due_at)
    .bind(row.notified_at)
    .bind(row.x)
    .bind(row.y)
    .bind(row.width)
    .bind(row.height)
    .fetch_one(&mut *tx)
    .await?;
    board::touch_board(&mut *tx, row.board_id).await?;
    tx.commit().await?;

    if rearmed && row.notified_at.is_none() {
        tracing::info!(%note_id, "sticky note re-armed for overdue check");
    }
    Ok(row)
}

/// Delete a note whose board is owned by `user_id`.
pub async fn delete_note(pool: &PgPool, user_id: Uuid, note_id: Uuid) -> Result<(), NoteError> {
    let mut tx = pool.begin().await?;
    let board_id: Uuid = sqlx::query_scalar(
        "DELETE FROM sticky_notes n
         USING boards b
         WHERE n.id = $1 AND b.id = n.board_id AND b.user_id = $2
         RETURNING n.board_id",
    )
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(NoteError::NotFound(note_id))?;
    board::touch_board(&mut *tx, board_id).await?;
    tx.commit().await?;

    tracing::info!(%note_id, %board_id, "sticky note deleted");
    Ok(())
}

#[cfg(test)]
#[path = "note_test.rs"]
mod tests;
