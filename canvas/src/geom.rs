//! Canvas-space geometry: pointer positions and entity rectangles.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in client (pointer) or canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `origin` to `self`.
    #[must_use]
    pub fn delta_from(self, origin: Point) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// Axis-aligned rectangle in canvas coordinates.
///
/// Transient rectangles carry fractional values while a gesture is in flight;
/// anything sent to the server goes through [`Rect::rounded`] first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Same size, top-left moved by `(dx, dy)`.
    #[must_use]
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..self }
    }

    /// Right edge (`x + width`).
    #[must_use]
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    #[must_use]
    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    /// Round every component to the nearest integer, as persisted.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rounded(self) -> IntRect {
        IntRect {
            x: self.x.round() as i32,
            y: self.y.round() as i32,
            width: self.width.round() as i32,
            height: self.height.round() as i32,
        }
    }
}

/// Integer rectangle; the persisted shape of a note or area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<IntRect> for Rect {
    fn from(r: IntRect) -> Self {
        Self::new(f64::from(r.x), f64::from(r.y), f64::from(r.width), f64::from(r.height))
    }
}
