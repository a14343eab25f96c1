//! Notification feed and read-state tracking.
//!
//! DESIGN
//! ======
//! Rows are only ever created by the overdue scan. The feed is strictly
//! newest-first (`created_at DESC, id DESC`) and read transitions never
//! reorder it. Marking read is a single conditional `UPDATE` that keeps an
//! existing `read_at`, so repeat calls return the original timestamp.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct NotificationRecord {
    id: Uuid,
    message: String,
    board_id: Uuid,
    sticky_note_id: Option<Uuid>,
    read_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
}

/// Notification as delivered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationDto {
    pub id: Uuid,
    pub message: String,
    pub board_id: Uuid,
    pub sticky_note_id: Option<Uuid>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<NotificationRecord> for NotificationDto {
    fn from(r: NotificationRecord) -> Self {
        Self {
            id: r.id,
            message: r.message,
            board_id: r.board_id,
            sticky_note_id: r.sticky_note_id,
            is_read: r.read_at.is_some(),
            read_at: r.read_at,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPage {
    pub data: Vec<NotificationDto>,
    pub has_more: bool,
}

/// Raw `?page=&per_page=` query.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    /// `(page, per_page)` after clamping: page is at least 1, per-page falls
    /// back to the default below 1 and is capped at the maximum.
    #[must_use]
    pub fn resolve(self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = match self.per_page {
            Some(n) if n >= 1 => n.min(MAX_PER_PAGE),
            _ => DEFAULT_PER_PAGE,
        };
        (page, per_page)
    }
}

/// Whether rows exist past the requested page.
#[must_use]
pub fn has_more(page: i64, per_page: i64, total: i64) -> bool {
    page.saturating_mul(per_page) < total
}

/// One page of the user's feed, newest first.
pub async fn list_notifications(pool: &PgPool, user_id: Uuid, query: PageQuery) -> Result<NotificationPage, NotificationError> {
    let (page, per_page) = query.resolve();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM board_notifications WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let offset = (page - 1).saturating_mul(per_page);
    let rows = sqlx::query_as::<_, NotificationRecord>(
        "SELECT id, message, board_id, sticky_note_id, read_at, created_at
         FROM board_notifications
         WHERE user_id = $1
         ORDER BY created_at DESC, id DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(NotificationPage {
        data: rows.into_iter().map(NotificationDto::from).collect(),
        has_more: has_more(page, per_page, total),
    })
}

/// Mark a notification read. Already-read notifications keep their timestamp.
pub async fn mark_read(pool: &PgPool, user_id: Uuid, notification_id: Uuid) -> Result<NotificationDto, NotificationError> {
    let row = sqlx::query_as::<_, NotificationRecord>(
        "UPDATE board_notifications
         SET read_at = COALESCE(read_at, now())
         WHERE id = $1 AND user_id = $2
         RETURNING id, message, board_id, sticky_note_id, read_at, created_at",
    )
    .bind(notification_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(NotificationError::NotFound(notification_id))?;
    Ok(row.into())
}

/// Count of unread notifications for the header badge.
pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, NotificationError> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM board_notifications WHERE user_id = $1 AND read_at IS NULL")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
#[path = "notification_test.rs"]
mod tests;
