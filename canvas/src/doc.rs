//! Document model: sticky notes, areas, and the in-memory store for one board.
//!
//! This module defines the wire types exchanged with the server
//! (`StickyNote`, `Area`, `BoardDetail`), the sparse-update types sent for
//! edits (`NotePatch`, `AreaPatch`), creation payloads (`NewNote`, `NewArea`),
//! the tagged selection model, and the runtime store that owns all live
//! entities (`DocStore`).
//!
//! Data flows into this layer from the network (JSON deserialization) and
//! from the board controller (optimistic patches). The host renders from
//! `DocStore::notes` / `DocStore::areas`.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::geom::IntRect;

/// Unique identifier for a board, note, area or notification.
pub type EntityId = Uuid;

/// Which kind of canvas entity an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Note,
    Area,
}

/// A sticky note as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickyNote {
    pub id: EntityId,
    pub board_id: EntityId,
    /// Free text; may span several lines.
    pub content: String,
    /// Colour token (`pink`, `yellow`, ...) or a CSS colour.
    pub color: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_at: Option<OffsetDateTime>,
    /// Set by the overdue scan; cleared by the server when the due date is re-armed.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub notified_at: Option<OffsetDateTime>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl StickyNote {
    #[must_use]
    pub fn rect(&self) -> IntRect {
        IntRect { x: self.x, y: self.y, width: self.width, height: self.height }
    }

    /// Whether the note should render with the overdue treatment at `now`.
    #[must_use]
    pub fn is_overdue(&self, now: OffsetDateTime) -> bool {
        self.due_at.is_some_and(|due| due < now)
    }
}

/// A labelled grouping rectangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: EntityId,
    pub board_id: EntityId,
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Area {
    #[must_use]
    pub fn rect(&self) -> IntRect {
        IntRect { x: self.x, y: self.y, width: self.width, height: self.height }
    }
}

/// Board metadata as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: EntityId,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A board together with every note and area on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: BoardSummary,
    #[serde(default)]
    pub sticky_notes: Vec<StickyNote>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

/// Payload for creating a note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNote {
    pub content: String,
    pub color: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_at: Option<OffsetDateTime>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Payload for creating an area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewArea {
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Sparse update for a note. Only present fields are sent and applied.
///
/// `due_at` is tri-state: `None` leaves it untouched, `Some(None)` clears it,
/// `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_due_patch")]
    pub due_at: Option<Option<OffsetDateTime>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
}

fn serialize_due_patch<S: Serializer>(value: &Option<Option<OffsetDateTime>>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(Some(due)) => time::serde::rfc3339::serialize(due, s),
        _ => s.serialize_none(),
    }
}

impl NotePatch {
    /// Patch that only moves the note.
    #[must_use]
    pub fn position(x: i32, y: i32) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    /// Patch that moves and resizes the note.
    #[must_use]
    pub fn geometry(rect: IntRect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Default::default()
        }
    }

    /// True when no content field (text, colour, due date) is touched.
    #[must_use]
    pub fn is_geometry_only(&self) -> bool {
        self.content.is_none() && self.color.is_none() && self.due_at.is_none()
    }

    /// Apply the present fields onto `note`.
    pub fn apply_to(&self, note: &mut StickyNote) {
        if let Some(content) = &self.content {
            note.content.clone_from(content);
        }
        if let Some(color) = &self.color {
            note.color.clone_from(color);
        }
        if let Some(due_at) = self.due_at {
            note.due_at = due_at;
        }
        if let Some(x) = self.x {
            note.x = x;
        }
        if let Some(y) = self.y {
            note.y = y;
        }
        if let Some(w) = self.width {
            note.width = w;
        }
        if let Some(h) = self.height {
            note.height = h;
        }
    }
}

/// Sparse update for an area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AreaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
}

impl AreaPatch {
    #[must_use]
    pub fn position(x: i32, y: i32) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    #[must_use]
    pub fn geometry(rect: IntRect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_geometry_only(&self) -> bool {
        self.title.is_none()
    }

    pub fn apply_to(&self, area: &mut Area) {
        if let Some(title) = &self.title {
            area.title.clone_from(title);
        }
        if let Some(x) = self.x {
            area.x = x;
        }
        if let Some(y) = self.y {
            area.y = y;
        }
        if let Some(w) = self.width {
            area.width = w;
        }
        if let Some(h) = self.height {
            area.height = h;
        }
    }
}

// ── Selection ───────────────────────────────────────────────────

/// The single selected entity, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub id: EntityId,
    pub kind: EntityKind,
}

/// Borrowed view of the selected entity for the edit panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectedItem<'a> {
    Note(&'a StickyNote),
    Area(&'a Area),
}

/// Which tab the edit panel shows. Follows the kind of the last selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelTab {
    #[default]
    Note,
    Area,
}

impl From<EntityKind> for PanelTab {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Note => Self::Note,
            EntityKind::Area => Self::Area,
        }
    }
}

// ── Colours ─────────────────────────────────────────────────────

/// Colour used when a note carries no colour at all.
pub const DEFAULT_NOTE_COLOR: &str = "#E0F2FE";

/// Palette offered by the edit panel, as `(label, css)` pairs.
pub const NOTE_PALETTE: [(&str, &str); 6] = [
    ("ピンク", "#FFD6E8"),
    ("黄色", "#FFF4CC"),
    ("緑", "#D4F4DD"),
    ("青", "#D6E9FF"),
    ("紫", "#E8D6FF"),
    ("ピーチ", "#FFDAD6"),
];

/// Resolve a stored colour token to a CSS colour.
#[must_use]
pub fn resolve_note_color(token: &str) -> &str {
    match token {
        "pink" => "#FFD6E8",
        "yellow" => "#FFF4CC",
        "green" => "#D4F4DD",
        "blue" => "#D6E9FF",
        "" => DEFAULT_NOTE_COLOR,
        other => other,
    }
}

// ── Store ───────────────────────────────────────────────────────

/// In-memory notes and areas of the open board.
#[derive(Debug, Default)]
pub struct DocStore {
    notes: HashMap<EntityId, StickyNote>,
    areas: HashMap<EntityId, Area>,
}

impl DocStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a server snapshot.
    pub fn load_snapshot(&mut self, notes: Vec<StickyNote>, areas: Vec<Area>) {
        self.notes = notes.into_iter().map(|n| (n.id, n)).collect();
        self.areas = areas.into_iter().map(|a| (a.id, a)).collect();
    }

    pub fn clear(&mut self) {
        self.notes.clear();
        self.areas.clear();
    }

    /// Insert or replace a note keyed by its server id.
    pub fn upsert_note(&mut self, note: StickyNote) {
        self.notes.insert(note.id, note);
    }

    pub fn upsert_area(&mut self, area: Area) {
        self.areas.insert(area.id, area);
    }

    pub fn remove_note(&mut self, id: &EntityId) -> Option<StickyNote> {
        self.notes.remove(id)
    }

    pub fn remove_area(&mut self, id: &EntityId) -> Option<Area> {
        self.areas.remove(id)
    }

    #[must_use]
    pub fn note(&self, id: &EntityId) -> Option<&StickyNote> {
        self.notes.get(id)
    }

    #[must_use]
    pub fn area(&self, id: &EntityId) -> Option<&Area> {
        self.areas.get(id)
    }

    /// Apply a patch to an existing note. Returns false if the note doesn't exist.
    pub fn patch_note(&mut self, id: &EntityId, patch: &NotePatch) -> bool {
        let Some(note) = self.notes.get_mut(id) else {
            return false;
        };
        patch.apply_to(note);
        true
    }

    pub fn patch_area(&mut self, id: &EntityId, patch: &AreaPatch) -> bool {
        let Some(area) = self.areas.get_mut(id) else {
            return false;
        };
        patch.apply_to(area);
        true
    }

    /// Whether an entity of `kind` with `id` is present.
    #[must_use]
    pub fn contains(&self, kind: EntityKind, id: &EntityId) -> bool {
        match kind {
            EntityKind::Note => self.notes.contains_key(id),
            EntityKind::Area => self.areas.contains_key(id),
        }
    }

    /// Notes in a stable order (by id).
    #[must_use]
    pub fn notes(&self) -> Vec<&StickyNote> {
        let mut notes: Vec<&StickyNote> = self.notes.values().collect();
        notes.sort_by_key(|n| n.id);
        notes
    }

    /// Areas in a stable order (by id).
    #[must_use]
    pub fn areas(&self) -> Vec<&Area> {
        let mut areas: Vec<&Area> = self.areas.values().collect();
        areas.sort_by_key(|a| a.id);
        areas
    }

    #[must_use]
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.areas.is_empty()
    }
}
