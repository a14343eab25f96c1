use super::*;
use time::macros::datetime;

fn query(page: Option<i64>, per_page: Option<i64>) -> PageQuery {
    PageQuery { page, per_page }
}

// =============================================================================
// PAGINATION
// =============================================================================

#[test]
fn resolve_defaults() {
    assert_eq!(query(None, None).resolve(), (1, DEFAULT_PER_PAGE));
}

#[test]
fn resolve_clamps_page_to_one() {
    assert_eq!(query(Some(0), Some(5)).resolve(), (1, 5));
    assert_eq!(query(Some(-3), Some(5)).resolve(), (1, 5));
}

#[test]
fn resolve_per_page_bounds() {
    assert_eq!(query(Some(2), Some(0)).resolve(), (2, 10));
    assert_eq!(query(Some(2), Some(-1)).resolve(), (2, 10));
    assert_eq!(query(Some(2), Some(51)).resolve(), (2, 50));
    assert_eq!(query(Some(2), Some(1)).resolve(), (2, 1));
}

#[test]
fn has_more_boundaries() {
    // Five rows, two per page.
    assert!(has_more(1, 2, 5));
    assert!(has_more(2, 2, 5));
    assert!(!has_more(3, 2, 5));
    assert!(!has_more(4, 2, 5));
    assert!(!has_more(1, 10, 10));
    assert!(!has_more(1, 10, 0));
}

#[test]
fn dto_reports_read_state() {
    let record = NotificationRecord {
        id: Uuid::nil(),
        message: "ボード「Projects」：付箋「a」の期限を超過しました。".into(),
        board_id: Uuid::nil(),
        sticky_note_id: None,
        read_at: Some(datetime!(2026-03-01 12:00 UTC)),
        created_at: datetime!(2026-03-01 11:00 UTC),
    };
    let json = serde_json::to_value(NotificationDto::from(record)).unwrap();
    assert_eq!(json["is_read"], true);
    assert_eq!(json["sticky_note_id"], serde_json::Value::Null);
    assert_eq!(json["created_at"], "2026-03-01T11:00:00Z");
}

// =============================================================================
// LIVE DATABASE
// =============================================================================

#[cfg(feature = "live-db-tests")]
async fn seed_notifications(pool: &PgPool, user_id: Uuid, count: i32) -> Uuid {
    let board_id: Uuid = sqlx::query_scalar("INSERT INTO boards (user_id, title) VALUES ($1, 'Projects') RETURNING id")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap();
    for i in 0..count {
        sqlx::query(
            "INSERT INTO board_notifications (user_id, board_id, message, created_at)
             VALUES ($1, $2, $3, now() - make_interval(mins => $4))",
        )
        .bind(user_id)
        .bind(board_id)
        .bind(format!("n{i}"))
        .bind(count - i)
        .execute(pool)
        .await
        .unwrap();
    }
    board_id
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn paginates_newest_first() {
    let pool = crate::state::test_helpers::integration_pool().await;
    let user = crate::state::test_helpers::seed_user(&pool, "reader").await;
    seed_notifications(&pool, user, 5).await;

    let first = list_notifications(&pool, user, query(Some(1), Some(2))).await.unwrap();
    assert_eq!(first.data.len(), 2);
    assert!(first.has_more);
    assert_eq!(first.data[0].message, "n4");

    let last = list_notifications(&pool, user, query(Some(3), Some(2))).await.unwrap();
    assert_eq!(last.data.len(), 1);
    assert!(!last.has_more);
    assert_eq!(last.data[0].message, "n0");

    let past = list_notifications(&pool, user, query(Some(4), Some(2))).await.unwrap();
    assert!(past.data.is_empty());
    assert!(!past.has_more);
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn mark_read_is_idempotent_and_owner_scoped() {
    let pool = crate::state::test_helpers::integration_pool().await;
    let user = crate::state::test_helpers::seed_user(&pool, "reader").await;
    let other = crate::state::test_helpers::seed_user(&pool, "other").await;
    seed_notifications(&pool, user, 2).await;
    assert_eq!(unread_count(&pool, user).await.unwrap(), 2);

    let id = list_notifications(&pool, user, PageQuery::default()).await.unwrap().data[0].id;
    assert!(matches!(mark_read(&pool, other, id).await, Err(NotificationError::NotFound(_))));

    let first = mark_read(&pool, user, id).await.unwrap();
    let second = mark_read(&pool, user, id).await.unwrap();
    assert!(first.is_read);
    assert_eq!(first.read_at, second.read_at);
    assert_eq!(unread_count(&pool, user).await.unwrap(), 1);
}
