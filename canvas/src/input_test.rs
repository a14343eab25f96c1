#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;

// =============================================================
// Helpers
// =============================================================

fn note_at(x: i32, y: i32) -> EntityGesture {
    EntityGesture::new(EntityKind::Note, Uuid::new_v4(), IntRect { x, y, width: 220, height: 160 })
}

fn area(x: i32, y: i32, width: i32, height: i32) -> EntityGesture {
    EntityGesture::new(EntityKind::Area, Uuid::new_v4(), IntRect { x, y, width, height })
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

// =============================================================
// Button / ResizeHandle
// =============================================================

#[test]
fn button_from_dom_codes() {
    assert_eq!(Button::from_dom(0), Some(Button::Primary));
    assert_eq!(Button::from_dom(1), Some(Button::Middle));
    assert_eq!(Button::from_dom(2), Some(Button::Secondary));
    assert_eq!(Button::from_dom(7), None);
}

#[test]
fn resize_handle_parse_round_trips_every_variant() {
    for handle in ResizeHandle::ALL {
        assert_eq!(ResizeHandle::parse(handle.as_str()), Some(handle));
    }
    assert_eq!(ResizeHandle::parse("north"), None);
}

#[test]
fn limits_follow_entity_kind() {
    assert_eq!(ResizeLimits::for_kind(EntityKind::Note), ResizeLimits::SIMPLE);
    assert_eq!(ResizeLimits::for_kind(EntityKind::Area), ResizeLimits::AREA);
    assert_eq!(ResizeLimits::AREA.min_width, 160.0);
    assert_eq!(ResizeLimits::AREA.min_height, 120.0);
}

// =============================================================
// Drag vs click
// =============================================================

#[test]
fn drag_by_fifty_minus_thirty_reports_rounded_position() {
    let mut g = note_at(100, 100);
    assert!(g.pointer_down(Button::Primary, pt(400.0, 300.0)));
    assert!(g.is_capturing());

    g.pointer_move(pt(420.0, 290.0));
    g.pointer_move(pt(450.0, 270.0));
    let outcome = g.pointer_up(pt(450.0, 270.0));

    assert_eq!(outcome, GestureOutcome::Move { x: 150, y: 70 });
    assert!(!g.is_capturing());
    assert_eq!(g.render_rect(), Rect::new(150.0, 70.0, 220.0, 160.0));
}

#[test]
fn small_wiggle_is_a_selection_click() {
    let mut g = note_at(100, 100);
    g.pointer_down(Button::Primary, pt(10.0, 10.0));
    g.pointer_move(pt(13.0, 8.0));
    g.pointer_move(pt(15.0, 15.0));
    let outcome = g.pointer_up(pt(12.0, 11.0));

    assert_eq!(outcome, GestureOutcome::Select);
    assert_eq!(g.render_rect(), Rect::new(100.0, 100.0, 220.0, 160.0));
}

#[test]
fn threshold_is_exclusive_at_five_pixels() {
    let mut g = note_at(0, 0);
    g.pointer_down(Button::Primary, pt(0.0, 0.0));
    g.pointer_move(pt(5.0, -5.0));
    assert_eq!(g.pointer_up(pt(5.0, -5.0)), GestureOutcome::Select);

    g.pointer_down(Button::Primary, pt(0.0, 0.0));
    g.pointer_move(pt(5.5, 0.0));
    assert_eq!(g.pointer_up(pt(5.5, 0.0)), GestureOutcome::Move { x: 6, y: 0 });
}

#[test]
fn moving_out_and_back_still_counts_as_drag() {
    let mut g = note_at(100, 100);
    g.pointer_down(Button::Primary, pt(0.0, 0.0));
    g.pointer_move(pt(40.0, 0.0));
    g.pointer_move(pt(1.0, 0.0));
    assert_eq!(g.pointer_up(pt(1.0, 0.0)), GestureOutcome::Move { x: 101, y: 100 });
}

#[test]
fn fractional_pointer_positions_round_on_commit() {
    let mut g = note_at(0, 0);
    g.pointer_down(Button::Primary, pt(0.0, 0.0));
    assert_eq!(g.pointer_up(pt(20.4, 30.6)), GestureOutcome::Move { x: 20, y: 31 });
}

#[test]
fn transient_position_tracks_pointer_mid_drag() {
    let mut g = note_at(100, 100);
    g.pointer_down(Button::Primary, pt(0.0, 0.0));
    let mid = g.pointer_move(pt(30.0, 40.0)).unwrap();
    assert_eq!(mid, Rect::new(130.0, 140.0, 220.0, 160.0));
    assert_eq!(g.render_rect(), mid);
}

#[test]
fn secondary_button_does_not_start_a_drag() {
    let mut g = note_at(0, 0);
    assert!(!g.pointer_down(Button::Secondary, pt(0.0, 0.0)));
    assert!(!g.is_capturing());
    assert_eq!(g.pointer_move(pt(50.0, 50.0)), None);
    assert_eq!(g.pointer_up(pt(50.0, 50.0)), GestureOutcome::None);
}

#[test]
fn pointer_up_without_gesture_is_none() {
    let mut g = note_at(0, 0);
    assert_eq!(g.pointer_up(pt(0.0, 0.0)), GestureOutcome::None);
}

#[test]
fn sync_is_ignored_while_dragging_and_applied_after() {
    let mut g = note_at(0, 0);
    g.pointer_down(Button::Primary, pt(0.0, 0.0));
    g.pointer_move(pt(50.0, 0.0));
    g.sync(IntRect { x: 999, y: 999, width: 220, height: 160 });
    assert_eq!(g.render_rect().x, 50.0);

    g.pointer_up(pt(50.0, 0.0));
    g.sync(IntRect { x: 60, y: 0, width: 220, height: 160 });
    assert_eq!(g.render_rect().x, 60.0);
}

#[test]
fn cancel_releases_capture_without_outcome() {
    let mut g = note_at(10, 10);
    g.pointer_down(Button::Primary, pt(0.0, 0.0));
    g.pointer_move(pt(100.0, 100.0));
    g.cancel();

    assert!(!g.is_capturing());
    assert_eq!(g.render_rect(), Rect::new(10.0, 10.0, 220.0, 160.0));
    assert_eq!(g.pointer_up(pt(100.0, 100.0)), GestureOutcome::None);
}

// =============================================================
// Resize
// =============================================================

#[test]
fn handles_require_selection() {
    let mut g = area(0, 0, 300, 200);
    assert!(!g.handle_down(ResizeHandle::Se, Button::Primary, pt(300.0, 200.0), false));
    assert!(!g.is_capturing());
    assert!(g.handle_down(ResizeHandle::Se, Button::Primary, pt(300.0, 200.0), true));
}

#[test]
fn southeast_handle_grows_width_and_height() {
    let mut g = area(100, 100, 300, 200);
    g.handle_down(ResizeHandle::Se, Button::Primary, pt(400.0, 300.0), true);
    let outcome = g.pointer_up(pt(450.0, 340.0));
    assert_eq!(outcome, GestureOutcome::Resize(IntRect { x: 100, y: 100, width: 350, height: 240 }));
}

#[test]
fn west_handle_keeps_right_edge_fixed() {
    let mut g = area(100, 100, 300, 200);
    g.handle_down(ResizeHandle::W, Button::Primary, pt(100.0, 150.0), true);
    let outcome = g.pointer_up(pt(60.0, 150.0));
    assert_eq!(outcome, GestureOutcome::Resize(IntRect { x: 60, y: 100, width: 340, height: 200 }));
}

#[test]
fn northwest_shrink_clamps_and_keeps_opposite_corner() {
    let mut g = area(100, 100, 300, 200);
    g.handle_down(ResizeHandle::Nw, Button::Primary, pt(100.0, 100.0), true);
    let outcome = g.pointer_up(pt(1000.0, 1000.0));

    let GestureOutcome::Resize(r) = outcome else {
        panic!("expected resize, got {outcome:?}");
    };
    assert_eq!(r.width, 160);
    assert_eq!(r.height, 120);
    assert_eq!(r.x + r.width, 400);
    assert_eq!(r.y + r.height, 300);
}

#[test]
fn simple_limits_floor_at_one_hundred() {
    let mut g = note_at(0, 0).with_limits(ResizeLimits::SIMPLE);
    g.handle_down(ResizeHandle::Se, Button::Primary, pt(0.0, 0.0), true);
    let outcome = g.pointer_up(pt(-500.0, -500.0));
    assert_eq!(outcome, GestureOutcome::Resize(IntRect { x: 0, y: 0, width: 100, height: 100 }));
}

#[test]
fn resize_without_movement_still_commits() {
    let mut g = area(10, 20, 300, 200);
    g.handle_down(ResizeHandle::E, Button::Primary, pt(310.0, 50.0), true);
    let outcome = g.pointer_up(pt(310.0, 50.0));
    assert_eq!(outcome, GestureOutcome::Resize(IntRect { x: 10, y: 20, width: 300, height: 200 }));
}

#[test]
fn resize_never_inverts_for_any_handle() {
    let start = Rect::new(50.0, 50.0, 200.0, 150.0);
    for handle in ResizeHandle::ALL {
        for (dx, dy) in [(-1000.0, -1000.0), (1000.0, 1000.0), (-1000.0, 1000.0), (1000.0, -1000.0)] {
            let r = resize_rect(start, handle, dx, dy, ResizeLimits::AREA);
            assert!(r.width >= 160.0, "{handle:?} produced width {}", r.width);
            assert!(r.height >= 120.0, "{handle:?} produced height {}", r.height);
            if handle.west() {
                assert_eq!(r.right(), start.right(), "{handle:?} moved the east edge");
            } else {
                assert_eq!(r.x, start.x, "{handle:?} moved the west edge");
            }
            if handle.north() {
                assert_eq!(r.bottom(), start.bottom(), "{handle:?} moved the south edge");
            } else {
                assert_eq!(r.y, start.y, "{handle:?} moved the north edge");
            }
        }
    }
}

#[test]
fn north_handle_only_touches_vertical_axis() {
    let r = resize_rect(Rect::new(0.0, 100.0, 300.0, 200.0), ResizeHandle::N, 70.0, -30.0, ResizeLimits::AREA);
    assert_eq!(r, Rect::new(0.0, 70.0, 300.0, 230.0));
}
