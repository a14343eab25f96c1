#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn point_delta_from_origin() {
    let p = Point::new(150.0, 70.0);
    assert_eq!(p.delta_from(Point::new(100.0, 100.0)), (50.0, -30.0));
}

#[test]
fn rect_translated_keeps_size() {
    let r = Rect::new(10.0, 20.0, 200.0, 120.0).translated(5.0, -5.0);
    assert_eq!(r, Rect::new(15.0, 15.0, 200.0, 120.0));
}

#[test]
fn rect_edges() {
    let r = Rect::new(10.0, 20.0, 200.0, 120.0);
    assert_eq!(r.right(), 210.0);
    assert_eq!(r.bottom(), 140.0);
}

#[test]
fn rect_rounded_rounds_half_away_from_zero() {
    let r = Rect::new(10.5, -3.5, 99.4, 100.6).rounded();
    assert_eq!(r, IntRect { x: 11, y: -4, width: 99, height: 101 });
}

#[test]
fn int_rect_converts_back_to_rect() {
    let r: Rect = IntRect { x: 1, y: 2, width: 3, height: 4 }.into();
    assert_eq!(r, Rect::new(1.0, 2.0, 3.0, 4.0));
}
