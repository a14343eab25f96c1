use serde_json::json;
use time::macros::datetime;
use uuid::Uuid;

use super::*;

// =============================================================
// Helpers
// =============================================================

fn make_note(x: i32, y: i32) -> StickyNote {
    StickyNote {
        id: Uuid::new_v4(),
        board_id: Uuid::new_v4(),
        content: "buy milk".into(),
        color: "yellow".into(),
        due_at: None,
        notified_at: None,
        x,
        y,
        width: 220,
        height: 160,
    }
}

fn make_area(x: i32, y: i32) -> Area {
    Area { id: Uuid::new_v4(), board_id: Uuid::new_v4(), title: "Backlog".into(), x, y, width: 360, height: 220 }
}

// =============================================================
// Wire format
// =============================================================

#[test]
fn board_detail_deserializes_flat_board_with_children() {
    let board_id = Uuid::new_v4();
    let note_id = Uuid::new_v4();
    let value = json!({
        "id": board_id,
        "title": "Projects",
        "description": null,
        "updated_at": "2026-01-27T09:00:00Z",
        "sticky_notes": [{
            "id": note_id,
            "board_id": board_id,
            "content": "ship it",
            "color": "pink",
            "due_at": "2026-01-28T00:00:00Z",
            "notified_at": null,
            "x": 120, "y": 140, "width": 220, "height": 160
        }],
        "areas": []
    });

    let detail: BoardDetail = serde_json::from_value(value).unwrap();
    assert_eq!(detail.board.id, board_id);
    assert_eq!(detail.board.title, "Projects");
    assert_eq!(detail.sticky_notes.len(), 1);
    assert_eq!(detail.sticky_notes[0].id, note_id);
    assert_eq!(detail.sticky_notes[0].due_at, Some(datetime!(2026-01-28 00:00 UTC)));
    assert!(detail.areas.is_empty());
}

#[test]
fn note_without_notified_field_defaults_to_none() {
    let value = json!({
        "id": Uuid::new_v4(),
        "board_id": Uuid::new_v4(),
        "content": "",
        "color": "",
        "due_at": null,
        "x": 0, "y": 0, "width": 10, "height": 10
    });
    let note: StickyNote = serde_json::from_value(value).unwrap();
    assert!(note.notified_at.is_none());
}

#[test]
fn position_patch_serializes_only_coordinates() {
    let value = serde_json::to_value(NotePatch::position(150, 70)).unwrap();
    assert_eq!(value, json!({ "x": 150, "y": 70 }));
}

#[test]
fn due_patch_distinguishes_clear_from_untouched() {
    let clear = NotePatch { due_at: Some(None), ..Default::default() };
    assert_eq!(serde_json::to_value(&clear).unwrap(), json!({ "due_at": null }));

    let set = NotePatch { due_at: Some(Some(datetime!(2026-02-01 12:00 UTC))), ..Default::default() };
    assert_eq!(serde_json::to_value(&set).unwrap(), json!({ "due_at": "2026-02-01T12:00:00Z" }));

    assert_eq!(serde_json::to_value(NotePatch::default()).unwrap(), json!({}));
}

// =============================================================
// Patches
// =============================================================

#[test]
fn geometry_patches_are_geometry_only() {
    assert!(NotePatch::position(1, 2).is_geometry_only());
    assert!(AreaPatch::geometry(IntRect { x: 0, y: 0, width: 200, height: 150 }).is_geometry_only());
    assert!(!NotePatch { content: Some("x".into()), ..Default::default() }.is_geometry_only());
    assert!(!NotePatch { due_at: Some(None), ..Default::default() }.is_geometry_only());
    assert!(!AreaPatch { title: Some("t".into()), ..Default::default() }.is_geometry_only());
}

#[test]
fn note_patch_applies_present_fields_only() {
    let mut note = make_note(10, 20);
    note.due_at = Some(datetime!(2026-01-01 00:00 UTC));
    NotePatch { content: Some("new".into()), due_at: Some(None), x: Some(99), ..Default::default() }.apply_to(&mut note);

    assert_eq!(note.content, "new");
    assert_eq!(note.color, "yellow");
    assert!(note.due_at.is_none());
    assert_eq!(note.x, 99);
    assert_eq!(note.y, 20);
}

#[test]
fn area_patch_applies_geometry() {
    let mut area = make_area(0, 0);
    AreaPatch::geometry(IntRect { x: -40, y: 5, width: 400, height: 260 }).apply_to(&mut area);
    assert_eq!(area.rect(), IntRect { x: -40, y: 5, width: 400, height: 260 });
    assert_eq!(area.title, "Backlog");
}

// =============================================================
// Overdue / colours
// =============================================================

#[test]
fn note_is_overdue_only_when_due_has_passed() {
    let now = datetime!(2026-01-27 12:00 UTC);
    let mut note = make_note(0, 0);
    assert!(!note.is_overdue(now));

    note.due_at = Some(datetime!(2026-01-27 11:00 UTC));
    assert!(note.is_overdue(now));

    note.due_at = Some(datetime!(2026-01-27 13:00 UTC));
    assert!(!note.is_overdue(now));
}

#[test]
fn colour_tokens_resolve_to_css() {
    assert_eq!(resolve_note_color("pink"), "#FFD6E8");
    assert_eq!(resolve_note_color("blue"), "#D6E9FF");
    assert_eq!(resolve_note_color("#123456"), "#123456");
    assert_eq!(resolve_note_color(""), DEFAULT_NOTE_COLOR);
}

#[test]
fn panel_tab_follows_entity_kind() {
    assert_eq!(PanelTab::from(EntityKind::Note), PanelTab::Note);
    assert_eq!(PanelTab::from(EntityKind::Area), PanelTab::Area);
    assert_eq!(PanelTab::default(), PanelTab::Note);
}

// =============================================================
// DocStore
// =============================================================

#[test]
fn store_starts_empty() {
    let store = DocStore::new();
    assert!(store.is_empty());
    assert_eq!(store.note_count(), 0);
    assert_eq!(store.area_count(), 0);
}

#[test]
fn load_snapshot_replaces_previous_contents() {
    let mut store = DocStore::new();
    store.upsert_note(make_note(0, 0));
    let fresh = make_note(5, 5);
    let fresh_id = fresh.id;
    store.load_snapshot(vec![fresh], vec![make_area(1, 1)]);

    assert_eq!(store.note_count(), 1);
    assert_eq!(store.area_count(), 1);
    assert!(store.note(&fresh_id).is_some());
}

#[test]
fn patch_missing_note_returns_false() {
    let mut store = DocStore::new();
    assert!(!store.patch_note(&Uuid::new_v4(), &NotePatch::position(1, 1)));
    assert!(!store.patch_area(&Uuid::new_v4(), &AreaPatch::position(1, 1)));
}

#[test]
fn contains_respects_kind() {
    let mut store = DocStore::new();
    let note = make_note(0, 0);
    let id = note.id;
    store.upsert_note(note);
    assert!(store.contains(EntityKind::Note, &id));
    assert!(!store.contains(EntityKind::Area, &id));
}

#[test]
fn listings_are_sorted_by_id() {
    let mut store = DocStore::new();
    for i in 0..5 {
        store.upsert_note(make_note(i, i));
    }
    let ids: Vec<_> = store.notes().iter().map(|n| n.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}
