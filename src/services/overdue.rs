//! Overdue notification generator.
//!
//! DESIGN
//! ======
//! Candidates are notes with `due_at <= now` and no `notified_at`. They are
//! walked in primary-key order in batches of `batch_size`. Each batch is one
//! transaction: the candidate rows are locked (`FOR UPDATE OF n`) together
//! with their board keys (`FOR KEY SHARE OF b`), one notification per note is
//! bulk-inserted, and the notes are bulk-marked with the run timestamp. The lock makes the scan wait for an in-flight due-date
//! edit; Postgres re-evaluates the candidate condition on the edited row, so a
//! re-armed note is never marked for its old due date.
//!
//! Notes are joined to their board for the owner and title. A note without a
//! board cannot exist under the cascading foreign key; the inner join would
//! leave it unmarked for the next run.
//!
//! SYSTEM CONTEXT
//! ==============
//! Driven on an interval by [`spawn_overdue_task`] inside the server, or once
//! by `stickyboard generate-overdue` from an external scheduler.

use std::time::Duration;

use sqlx::{PgConnection, PgPool};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use uuid::Uuid;

/// Board label used when the title is blank.
pub const UNTITLED_BOARD: &str = "（無題）";
const LABEL_MAX_CHARS: usize = 30;
const ELLIPSIS: char = '…';

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Totals for one scan run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub batches: usize,
    pub notified: usize,
}

#[derive(Debug, sqlx::FromRow)]
struct Candidate {
    id: Uuid,
    board_id: Uuid,
    content: String,
    board_title: String,
    user_id: Uuid,
}

// =============================================================================
// MESSAGE
// =============================================================================

/// Collapse newlines and runs of whitespace into single spaces, trimmed.
#[must_use]
pub fn squish(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut to `max` characters, appending an ellipsis when anything was dropped.
/// Counts chars, not display columns, so full-width text keeps `max` glyphs.
#[must_use]
pub fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.truncate(cut.trim_end().len());
    cut.push(ELLIPSIS);
    cut
}

/// Notification text for a note that became overdue.
#[must_use]
pub fn build_overdue_message(board_title: &str, content: &str) -> String {
    let board = squish(board_title);
    let label = if board.is_empty() { UNTITLED_BOARD.to_owned() } else { truncate_label(&board, LABEL_MAX_CHARS) };

    let body = squish(content);
    if body.is_empty() {
        return format!("ボード「{label}」：付箋の期限を超過しました。");
    }
    let title = truncate_label(&body, LABEL_MAX_CHARS);
    format!("ボード「{label}」：付箋「{title}」の期限を超過しました。")
}

// =============================================================================
// SCAN
// =============================================================================

/// Select and lock the next batch of overdue notes after `after`.
///
/// Notes are locked for update and their boards for key share in one
/// statement, so a concurrent board delete queues behind the batch.
async fn lock_candidates(
    conn: &mut PgConnection,
    now: OffsetDateTime,
    after: Option<Uuid>,
    limit: i64,
) -> Result<Vec<Candidate>, sqlx::Error> {
    sqlx::query_as::<_, Candidate>(
        "SELECT n.id, n.board_id, n.content, b.title AS board_title, b.user_id
         FROM sticky_notes n
         JOIN boards b ON b.id = n.board_id
         WHERE n.due_at IS NOT NULL
           AND n.due_at <= $1
           AND n.notified_at IS NULL
           AND ($2::uuid IS NULL OR n.id > $2)
         ORDER BY n.id
         LIMIT $3
         FOR UPDATE OF n
         FOR KEY SHARE OF b",
    )
    .bind(now)
    .bind(after)
    .bind(limit)
    .fetch_all(conn)
    .await
}

/// Insert one notification per candidate and mark the notes notified.
async fn record_batch(conn: &mut PgConnection, candidates: Vec<Candidate>, now: OffsetDateTime) -> Result<usize, sqlx::Error> {
    let count = candidates.len();
    let mut user_ids = Vec::with_capacity(count);
    let mut board_ids = Vec::with_capacity(count);
    let mut note_ids = Vec::with_capacity(count);
    let mut messages = Vec::with_capacity(count);
    for c in candidates {
        messages.push(build_overdue_message(&c.board_title, &c.content));
        user_ids.push(c.user_id);
        board_ids.push(c.board_id);
        note_ids.push(c.id);
    }

    sqlx::query(
        "INSERT INTO board_notifications (user_id, board_id, sticky_note_id, message, created_at)
         SELECT u, b, n, m, $5
         FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::text[]) AS t(u, b, n, m)",
    )
    .bind(&user_ids)
    .bind(&board_ids)
    .bind(&note_ids)
    .bind(&messages)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    sqlx::query("UPDATE sticky_notes SET notified_at = $2 WHERE id = ANY($1)")
        .bind(&note_ids)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(count)
}

/// Notify every note that is overdue as of `now`.
///
/// # Errors
///
/// Returns the first database error. Batches committed before the failure
/// stay committed; the failed batch is rolled back and picked up next run.
pub async fn run_scan(pool: &PgPool, now: OffsetDateTime, batch_size: i64) -> Result<ScanReport, ScanError> {
    let batch_size = batch_size.max(1);
    let mut report = ScanReport::default();
    let mut after: Option<Uuid> = None;

    loop {
        let mut tx = pool.begin().await?;
        let candidates = lock_candidates(&mut *tx, now, after, batch_size).await?;

        let Some(last) = candidates.last() else {
            tx.commit().await?;
            break;
        };
        after = Some(last.id);

        let fetched = record_batch(&mut *tx, candidates, now).await?;
        tx.commit().await?;

        report.batches += 1;
        report.notified += fetched;
        info!(batch = report.batches, notified = fetched, "overdue batch committed");

        if i64::try_from(fetched).unwrap_or(i64::MAX) < batch_size {
            break;
        }
    }

    info!(batches = report.batches, notified = report.notified, "overdue scan finished");
    Ok(report)
}

/// Run [`run_scan`] every `interval_secs`. Failures are logged and the next
/// tick tries again.
pub fn spawn_overdue_task(pool: PgPool, interval_secs: u64, batch_size: i64) -> JoinHandle<()> {
    info!(interval_secs, batch_size, "overdue scan scheduled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = run_scan(&pool, OffsetDateTime::now_utc(), batch_size).await {
                error!(error = %e, "overdue scan failed");
            }
        }
    })
}

#[cfg(test)]
#[path = "overdue_test.rs"]
mod tests;
