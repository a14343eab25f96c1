use super::*;
use image::{GenericImageView, Rgb, RgbImage};

fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
    out
}

// =============================================================================
// UPLOAD CHECKS
// =============================================================================

#[test]
fn check_upload_accepts_png() {
    assert_eq!(check_upload(&sample_png(4, 4), 1024 * 1024).unwrap(), ImageFormat::Png);
}

#[test]
fn check_upload_rejects_oversize_before_sniffing() {
    let err = check_upload(&[0_u8; 32], 16).unwrap_err();
    assert!(matches!(err, AvatarError::TooLarge { size: 32, max: 16 }));
}

#[test]
fn check_upload_rejects_non_images() {
    assert!(matches!(check_upload(b"%PDF-1.7 hello", 1024), Err(AvatarError::Unsupported)));
    assert!(matches!(check_upload(b"", 1024), Err(AvatarError::Unsupported)));
}

#[test]
fn random_suffix_is_ten_alphanumerics() {
    let s = random_suffix();
    assert_eq!(s.len(), 10);
    assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn only_database_errors_are_retried() {
    assert!(AvatarError::Database(sqlx::Error::PoolTimedOut).is_transient());
    assert!(!AvatarError::Unsupported.is_transient());
    assert!(!AvatarError::QueueFull.is_transient());
}

#[tokio::test]
async fn enqueue_reports_full_and_closed_queues() {
    let (tx, rx) = mpsc::channel(1);
    let job = AvatarJob { user_id: Uuid::nil(), temp_path: PathBuf::from("/tmp/x") };
    enqueue(&tx, job.clone()).unwrap();
    assert!(matches!(enqueue(&tx, job.clone()), Err(AvatarError::QueueFull)));
    drop(rx);
    assert!(matches!(enqueue(&tx, job), Err(AvatarError::QueueClosed)));
}

// =============================================================================
// IMAGE
// =============================================================================

#[test]
fn render_produces_masked_square_png() {
    let png = render_avatar(&sample_png(300, 120), 64).unwrap();
    let out = image::load_from_memory(&png).unwrap();
    assert_eq!(out.dimensions(), (64, 64));

    let rgba = out.to_rgba8();
    assert_eq!(rgba.get_pixel(0, 0)[3], 0);
    assert_eq!(rgba.get_pixel(63, 63)[3], 0);
    assert_eq!(rgba.get_pixel(63, 0)[3], 0);
    assert_eq!(rgba.get_pixel(32, 32)[3], 255);
    assert_eq!(rgba.get_pixel(32, 1)[3], 255);
}

#[test]
fn render_rejects_garbage() {
    assert!(matches!(render_avatar(b"not an image", 64), Err(AvatarError::Decode(_))));
}

#[test]
fn mask_keeps_inscribed_circle() {
    let mut img = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
    apply_circle_mask(&mut img);
    // Corners fall outside a radius-2 circle; the centre four stay.
    assert_eq!(img.get_pixel(0, 0)[3], 0);
    assert_eq!(img.get_pixel(3, 0)[3], 0);
    assert_eq!(img.get_pixel(1, 1)[3], 255);
    assert_eq!(img.get_pixel(2, 2)[3], 255);
}

// =============================================================================
// STORAGE PATHS
// =============================================================================

#[test]
fn public_path_from_absolute_url() {
    assert_eq!(
        avatar_url_to_public_path("http://localhost:3000/storage/avatars/avatar_1_abc.png"),
        Some(PathBuf::from("avatars/avatar_1_abc.png"))
    );
}

#[test]
fn public_path_from_root_relative_url() {
    assert_eq!(
        avatar_url_to_public_path("/storage/avatars/a.png?v=2"),
        Some(PathBuf::from("avatars/a.png"))
    );
}

#[test]
fn public_path_ignores_foreign_locations() {
    assert_eq!(avatar_url_to_public_path("https://lh3.googleusercontent.com/a/photo.jpg"), None);
    assert_eq!(avatar_url_to_public_path("http://localhost/storage/other/a.png"), None);
    assert_eq!(avatar_url_to_public_path("http://localhost/storage/avatars/"), None);
    assert_eq!(avatar_url_to_public_path("/storage/avatars/../secret.txt"), None);
    assert_eq!(avatar_url_to_public_path(""), None);
}

#[test]
fn public_url_joins_base() {
    assert_eq!(
        public_url("http://localhost:3000/", "avatars/a.png"),
        "http://localhost:3000/storage/avatars/a.png"
    );
}

// =============================================================================
// WORKER
// =============================================================================

#[cfg(feature = "live-db-tests")]
fn scratch_config() -> AppConfig {
    let mut config = AppConfig::for_database("postgres://unused");
    config.storage_dir = std::env::temp_dir().join(format!("stickyboard-avatar-{}", Uuid::new_v4()));
    config.avatar.size_px = 32;
    config
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn job_replaces_avatar_and_removes_previous_file() {
    let pool = crate::state::test_helpers::integration_pool().await;
    let config = scratch_config();
    let user = crate::state::test_helpers::seed_user(&pool, "pic").await;

    tokio::fs::create_dir_all(config.avatar_dir()).await.unwrap();
    let old = config.avatar_dir().join("avatar_old.png");
    tokio::fs::write(&old, b"old").await.unwrap();
    sqlx::query("UPDATE users SET avatar_url = $2 WHERE id = $1")
        .bind(user)
        .bind("http://localhost:3000/storage/avatars/avatar_old.png")
        .execute(&pool)
        .await
        .unwrap();

    let temp = stage_upload(&config.tmp_dir(), user, &sample_png(50, 80)).await.unwrap();
    let job = AvatarJob { user_id: user, temp_path: temp.clone() };
    let JobOutcome::Completed(url) = process_job(&pool, &config, &job).await.unwrap() else {
        panic!("job should complete");
    };

    assert!(url.starts_with(&format!("http://localhost:3000/storage/avatars/avatar_{user}_")));
    assert!(!temp.exists());
    assert!(!old.exists());
    let stored: Option<String> = sqlx::query_scalar("SELECT avatar_url FROM users WHERE id = $1")
        .bind(user)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored.as_deref(), Some(url.as_str()));

    // Replaying the same job finds no staged file and changes nothing.
    assert_eq!(process_job(&pool, &config, &job).await.unwrap(), JobOutcome::Skipped);
    tokio::fs::remove_dir_all(&config.storage_dir).await.unwrap();
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn undecodable_upload_leaves_user_untouched() {
    let pool = crate::state::test_helpers::integration_pool().await;
    let config = scratch_config();
    let user = crate::state::test_helpers::seed_user(&pool, "pic").await;

    let temp = stage_upload(&config.tmp_dir(), user, b"garbage").await.unwrap();
    let job = AvatarJob { user_id: user, temp_path: temp };
    assert!(matches!(process_job(&pool, &config, &job).await, Err(AvatarError::Decode(_))));

    let stored: Option<String> = sqlx::query_scalar("SELECT avatar_url FROM users WHERE id = $1")
        .bind(user)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, None);
    tokio::fs::remove_dir_all(&config.storage_dir).await.unwrap();
}
