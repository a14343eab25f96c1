//! Avatar processing: upload staging, a bounded job queue, and the worker
//! that turns an upload into a circular PNG thumbnail.
//!
//! DESIGN
//! ======
//! The profile route validates and stages the upload under `tmp/`, then
//! enqueues an [`AvatarJob`]. The worker decodes and masks on the blocking
//! pool, writes `avatars/avatar_{user}_{random}.png`, points the user row at
//! it, removes the staged file, and finally removes the previous avatar if it
//! lived under `/storage/avatars/`.
//!
//! ERROR HANDLING
//! ==============
//! Missing user, missing staged file, decode and encode failures end the job
//! without touching the user row. Database failures are retried with linear
//! back-off. A failed user update removes the freshly written PNG, and the
//! staged file is only deleted after the update commits, so a retried job
//! starts from the same input and a job whose input is gone is a no-op.

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::AppConfig;

const RANDOM_NAME_LEN: usize = 10;
const PUBLIC_PREFIX: &str = "/storage/";
const AVATAR_SUBDIR: &str = "avatars";

#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    #[error("upload is {size} bytes; limit is {max}")]
    TooLarge { size: usize, max: usize },
    #[error("upload is not a supported image")]
    Unsupported,
    #[error("image decode failed: {0}")]
    Decode(image::ImageError),
    #[error("image encode failed: {0}")]
    Encode(image::ImageError),
    #[error("avatar queue is full")]
    QueueFull,
    #[error("avatar queue is closed")]
    QueueClosed,
    #[error("image task failed: {0}")]
    Task(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AvatarError {
    /// Whether the worker should try the job again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// One queued avatar update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarJob {
    pub user_id: Uuid,
    pub temp_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The user now points at this public URL.
    Completed(String),
    /// Nothing to do: the user or the staged file is gone.
    Skipped,
}

// =============================================================================
// UPLOAD
// =============================================================================

/// Random alphanumeric suffix for stored file names.
#[must_use]
pub fn random_suffix() -> String {
    rand::rng().sample_iter(&Alphanumeric).take(RANDOM_NAME_LEN).map(char::from).collect()
}

/// Check size and sniff the format of an uploaded avatar.
///
/// # Errors
///
/// Returns [`AvatarError::TooLarge`] past `max_bytes` and
/// [`AvatarError::Unsupported`] for anything but PNG, JPEG or WebP.
pub fn check_upload(bytes: &[u8], max_bytes: usize) -> Result<ImageFormat, AvatarError> {
    if bytes.len() > max_bytes {
        return Err(AvatarError::TooLarge { size: bytes.len(), max: max_bytes });
    }
    match image::guess_format(bytes) {
        Ok(format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP)) => Ok(format),
        _ => Err(AvatarError::Unsupported),
    }
}

/// Write an accepted upload under `tmp_dir` and return its path.
pub async fn stage_upload(tmp_dir: &Path, user_id: Uuid, bytes: &[u8]) -> Result<PathBuf, AvatarError> {
    tokio::fs::create_dir_all(tmp_dir).await?;
    let path = tmp_dir.join(format!("upload_{user_id}_{}", random_suffix()));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Queue a job without waiting for capacity.
///
/// # Errors
///
/// Returns [`AvatarError::QueueFull`] or [`AvatarError::QueueClosed`].
pub fn enqueue(tx: &mpsc::Sender<AvatarJob>, job: AvatarJob) -> Result<(), AvatarError> {
    match tx.try_send(job) {
        Ok(()) => Ok(()),
        Err(mpsc::error::TrySendError::Full(_)) => Err(AvatarError::QueueFull),
        Err(mpsc::error::TrySendError::Closed(_)) => Err(AvatarError::QueueClosed),
    }
}

// =============================================================================
// IMAGE
// =============================================================================

/// Clear every pixel outside the inscribed circle.
pub fn apply_circle_mask(img: &mut RgbaImage) {
    let size = f64::from(img.width().min(img.height()));
    let radius = size / 2.0;
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let dx = f64::from(x) - radius + 0.5;
        let dy = f64::from(y) - radius + 0.5;
        if dx * dx + dy * dy > radius * radius {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
}

/// Cover-crop to a `size`×`size` square, mask to a circle, encode as PNG.
///
/// # Errors
///
/// Returns [`AvatarError::Decode`] or [`AvatarError::Encode`].
pub fn render_avatar(bytes: &[u8], size: u32) -> Result<Vec<u8>, AvatarError> {
    let source = image::load_from_memory(bytes).map_err(AvatarError::Decode)?;
    let mut square = source.resize_to_fill(size, size, FilterType::Lanczos3).to_rgba8();
    apply_circle_mask(&mut square);

    let mut out = Vec::new();
    square
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(AvatarError::Encode)?;
    Ok(out)
}

// =============================================================================
// STORAGE PATHS
// =============================================================================

/// Map a stored avatar URL to a path relative to the public directory.
/// Only URLs whose path is under `/storage/avatars/` qualify; external
/// avatars (for example a Google profile picture) yield `None`.
#[must_use]
pub fn avatar_url_to_public_path(url: &str) -> Option<PathBuf> {
    let path = if url.starts_with('/') {
        url.split(['?', '#']).next()?.to_owned()
    } else {
        Url::parse(url).ok()?.path().to_owned()
    };
    let relative = path.strip_prefix(PUBLIC_PREFIX)?.trim_start_matches('/');
    let relative = PathBuf::from(relative);

    let mut components = relative.components();
    if components.next() != Some(Component::Normal(AVATAR_SUBDIR.as_ref())) {
        return None;
    }
    let rest: Vec<_> = components.collect();
    if rest.is_empty() || !rest.iter().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(relative)
}

fn public_url(base: &str, relative: &str) -> String {
    format!("{}{PUBLIC_PREFIX}{relative}", base.trim_end_matches('/'))
}

// =============================================================================
// WORKER
// =============================================================================

/// Process one job.
///
/// # Errors
///
/// Returns the failure that ended the job; see [`AvatarError::is_transient`].
pub async fn process_job(pool: &PgPool, config: &AppConfig, job: &AvatarJob) -> Result<JobOutcome, AvatarError> {
    let user_id = job.user_id;
    info!(%user_id, temp_path = %job.temp_path.display(), "avatar job start");

    let Some(previous_url) = sqlx::query_scalar::<_, Option<String>>("SELECT avatar_url FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
    else {
        warn!(%user_id, "avatar job abort: user not found");
        return Ok(JobOutcome::Skipped);
    };

    let bytes = match tokio::fs::read(&job.temp_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(%user_id, temp_path = %job.temp_path.display(), "avatar job abort: temp file missing");
            return Ok(JobOutcome::Skipped);
        }
        Err(e) => return Err(e.into()),
    };

    let size = config.avatar.size_px;
    let png = tokio::task::spawn_blocking(move || render_avatar(&bytes, size))
        .await
        .map_err(|e| AvatarError::Task(e.to_string()))??;

    let file_name = format!("avatar_{user_id}_{}.png", random_suffix());
    let relative = format!("{AVATAR_SUBDIR}/{file_name}");
    let avatar_dir = config.avatar_dir();
    tokio::fs::create_dir_all(&avatar_dir).await?;
    let dest = avatar_dir.join(&file_name);
    tokio::fs::write(&dest, &png).await?;

    let url = public_url(&config.public_base_url, &relative);
    let updated = sqlx::query("UPDATE users SET avatar_url = $2, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .bind(&url)
        .execute(pool)
        .await;
    if let Err(e) = updated {
        if let Err(rm) = tokio::fs::remove_file(&dest).await {
            warn!(%user_id, error = %rm, "failed to remove unreferenced avatar");
        }
        return Err(e.into());
    }

    if let Err(e) = tokio::fs::remove_file(&job.temp_path).await {
        warn!(%user_id, error = %e, "failed to remove staged avatar upload");
    }

    remove_previous(config, user_id, previous_url.as_deref(), &relative).await;
    info!(%user_id, %url, "avatar job complete");
    Ok(JobOutcome::Completed(url))
}

async fn remove_previous(config: &AppConfig, user_id: Uuid, previous_url: Option<&str>, current: &str) {
    let previous = previous_url.and_then(avatar_url_to_public_path);
    match previous {
        Some(path) if path != Path::new(current) => {
            let absolute = config.public_dir().join(&path);
            match tokio::fs::remove_file(&absolute).await {
                Ok(()) => info!(%user_id, previous = %path.display(), "previous avatar removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    info!(%user_id, previous = %path.display(), "previous avatar already gone");
                }
                Err(e) => warn!(%user_id, previous = %path.display(), error = %e, "previous avatar removal failed"),
            }
        }
        _ => info!(%user_id, previous_url, "previous avatar removal skipped"),
    }
}

async fn process_with_retry(pool: &PgPool, config: &AppConfig, job: &AvatarJob) {
    let retries = config.avatar.retries.max(1);
    for attempt in 1..=retries {
        match process_job(pool, config, job).await {
            Ok(_) => return,
            Err(e) if e.is_transient() && attempt < retries => {
                warn!(user_id = %job.user_id, attempt, error = %e, "avatar job failed; retrying");
                let backoff = config.avatar.retry_base_ms.saturating_mul(u64::try_from(attempt).unwrap_or(u64::MAX));
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                error!(user_id = %job.user_id, attempt, error = %e, "avatar job abort");
                return;
            }
        }
    }
}

/// Spawn the avatar worker and return its queue sender. Jobs are processed
/// one at a time in arrival order.
#[must_use]
pub fn spawn_avatar_worker(pool: PgPool, config: Arc<AppConfig>) -> mpsc::Sender<AvatarJob> {
    let (tx, mut rx) = mpsc::channel::<AvatarJob>(config.avatar.queue_capacity);
    info!(
        queue_capacity = config.avatar.queue_capacity,
        retries = config.avatar.retries,
        retry_base_ms = config.avatar.retry_base_ms,
        size_px = config.avatar.size_px,
        "avatar worker configured"
    );

    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            process_with_retry(&pool, &config, &job).await;
        }
        info!("avatar worker stopped");
    });

    tx
}

#[cfg(test)]
#[path = "avatar_test.rs"]
mod tests;
