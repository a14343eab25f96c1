use super::*;

fn png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]));
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png).unwrap();
    out
}

#[test]
fn name_is_required_and_trimmed() {
    assert_eq!(validate_profile(Some("  花子 "), None, 1024).unwrap(), "花子");
    assert!(validate_profile(None, None, 1024).unwrap_err().has("name"));
    assert!(validate_profile(Some("   "), None, 1024).unwrap_err().has("name"));
}

#[test]
fn name_length_is_capped() {
    let long = "名".repeat(MAX_NAME_CHARS + 1);
    assert!(validate_profile(Some(long.as_str()), None, 1024).unwrap_err().has("name"));
}

#[test]
fn avatar_must_be_an_image() {
    let err = validate_profile(Some("花子"), Some(&b"plain text"[..]), 1024).unwrap_err();
    assert!(err.has("avatar"));
    assert!(!err.has("name"));
}

#[test]
fn avatar_size_is_limited() {
    let bytes = png();
    let err = validate_profile(Some("花子"), Some(bytes.as_slice()), 8).unwrap_err();
    assert!(err.has("avatar"));
    assert!(validate_profile(Some("花子"), Some(bytes.as_slice()), 1024 * 1024).is_ok());
}

#[test]
fn both_fields_reported_together() {
    let err = validate_profile(Some(""), Some(&b"nope"[..]), 1024).unwrap_err();
    assert!(err.has("name"));
    assert!(err.has("avatar"));
}

#[test]
fn profile_view_serializes_avatar_key() {
    let view = ProfileView { name: "花子".into(), avatar: None };
    let json = serde_json::to_value(view).unwrap();
    assert_eq!(json, serde_json::json!({ "name": "花子", "avatar": null }));
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn update_name_returns_current_avatar() {
    let pool = crate::state::test_helpers::integration_pool().await;
    let user = crate::state::test_helpers::seed_user(&pool, "taro").await;
    let view = update_name(&pool, user, "太郎").await.unwrap();
    assert_eq!(view.name, "太郎");
    assert_eq!(view.avatar, None);
    assert_eq!(get_profile(&pool, user).await.unwrap(), view);
    assert!(matches!(update_name(&pool, Uuid::new_v4(), "x").await, Err(ProfileError::NotFound(_))));
}
