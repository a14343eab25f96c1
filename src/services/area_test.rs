use super::*;

#[test]
fn create_requires_title_and_geometry() {
    let err = CreateArea { title: Some(" ".into()), x: Some(0), ..CreateArea::default() }
        .validate()
        .unwrap_err();
    assert!(err.has("title"));
    assert!(err.has("y"));
    assert!(err.has("height"));
    assert!(!err.has("x"));
}

#[test]
fn create_trims_title() {
    let area = CreateArea {
        title: Some(" 今週 ".into()),
        x: Some(100),
        y: Some(120),
        width: Some(360),
        height: Some(220),
    }
    .validate()
    .unwrap();
    assert_eq!(area.title, "今週");
    assert_eq!((area.x, area.y, area.width, area.height), (100, 120, 360, 220));
}

#[test]
fn patch_only_checks_supplied_title() {
    let geometry_only = AreaPatch { width: Some(400), ..AreaPatch::default() };
    assert_eq!(geometry_only.clone().validate().unwrap(), geometry_only);

    let err = AreaPatch { title: Some(String::new()), ..AreaPatch::default() }.validate().unwrap_err();
    assert!(err.has("title"));

    let long = "x".repeat(MAX_AREA_TITLE_CHARS + 1);
    assert!(AreaPatch { title: Some(long), ..AreaPatch::default() }.validate().is_err());
}

#[test]
fn patch_deserializes_partial_json() {
    let patch: AreaPatch = serde_json::from_value(serde_json::json!({ "x": 10, "width": 200 })).unwrap();
    assert_eq!(patch.x, Some(10));
    assert_eq!(patch.width, Some(200));
    assert_eq!(patch.title, None);
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn area_lifecycle_is_owner_scoped() {
    let pool = crate::state::test_helpers::integration_pool().await;
    let owner = crate::state::test_helpers::seed_user(&pool, "owner").await;
    let intruder = crate::state::test_helpers::seed_user(&pool, "intruder").await;
    let board = board::create_board(&pool, owner, board::BoardInput { title: Some("Projects".into()), description: None })
        .await
        .unwrap();

    let input = CreateArea {
        title: Some("Backlog".into()),
        x: Some(100),
        y: Some(120),
        width: Some(360),
        height: Some(220),
    };
    assert!(matches!(
        create_area(&pool, intruder, board.id, input.clone()).await,
        Err(AreaError::BoardNotFound(_))
    ));

    let area = create_area(&pool, owner, board.id, input).await.unwrap();
    let resized = update_area(&pool, owner, area.id, AreaPatch { width: Some(480), ..AreaPatch::default() })
        .await
        .unwrap();
    assert_eq!(resized.width, 480);
    assert_eq!(resized.title, "Backlog");

    assert!(matches!(
        update_area(&pool, intruder, area.id, AreaPatch::default()).await,
        Err(AreaError::NotFound(_))
    ));
    assert!(matches!(delete_area(&pool, intruder, area.id).await, Err(AreaError::NotFound(_))));
    delete_area(&pool, owner, area.id).await.unwrap();
}
