//! Canvas state store and the per-board controller.
//!
//! DESIGN
//! ======
//! `CanvasStore` is the single source of truth for the open board: the
//! notes and areas, the load state, and the one selected entity. It is
//! synchronous and owns no I/O.
//!
//! `BoardController` owns a store and a [`BoardGateway`] and implements the
//! mutation policy:
//!
//! - create: append only after the server returns the new row
//! - geometry: apply locally first, then replace with the server copy; roll
//!   back to the previous copy if the request fails
//! - content edits and deletes: produce a [`ConfirmRequest`] first; nothing
//!   changes locally until the user accepts and the server succeeds
//!
//! A shared [`Liveness`] flag lets the host mark the view as torn down while
//! a request is still in flight; responses that arrive afterwards are
//! dropped instead of being applied.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;

use crate::doc::{
    Area, AreaPatch, BoardSummary, DocStore, EntityId, EntityKind, NOTE_PALETTE, NewArea, NewNote, NotePatch,
    PanelTab, SelectedItem, Selection, StickyNote,
};
use crate::gateway::{BoardGateway, GatewayError};
use crate::input::GestureOutcome;

// ── Errors ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("{kind:?} {id} is not on this board")]
    UnknownEntity { kind: EntityKind, id: EntityId },
    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: &'static str },
    /// The view was torn down before the response arrived.
    #[error("board view is no longer mounted")]
    Unmounted,
}

// ── Liveness ────────────────────────────────────────────────────

/// Shared mounted flag. Cloned into the host's teardown hook.
#[derive(Debug, Clone)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    #[must_use]
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    pub fn unmount(&self) {
        self.0.set(false);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

// ── Store ───────────────────────────────────────────────────────

/// Load state of the open board.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
    /// Load failed; the view shows an error and does not retry.
    Failed(GatewayError),
}

#[derive(Debug, Default)]
pub struct CanvasStore {
    board: Option<BoardSummary>,
    doc: DocStore,
    load: LoadState,
    selection: Option<Selection>,
    panel_tab: PanelTab,
}

impl CanvasStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    #[must_use]
    pub fn board(&self) -> Option<&BoardSummary> {
        self.board.as_ref()
    }

    #[must_use]
    pub fn doc(&self) -> &DocStore {
        &self.doc
    }

    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    #[must_use]
    pub fn panel_tab(&self) -> PanelTab {
        self.panel_tab
    }

    /// Select an entity. Unknown ids leave the current selection alone.
    pub fn select(&mut self, kind: EntityKind, id: EntityId) -> bool {
        if !self.doc.contains(kind, &id) {
            return false;
        }
        self.selection = Some(Selection { id, kind });
        self.panel_tab = PanelTab::from(kind);
        true
    }

    /// Empty-canvas click.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// The selected entity as a tagged borrow for the edit panel.
    #[must_use]
    pub fn selected_item(&self) -> Option<SelectedItem<'_>> {
        let sel = self.selection?;
        match sel.kind {
            EntityKind::Note => self.doc.note(&sel.id).map(SelectedItem::Note),
            EntityKind::Area => self.doc.area(&sel.id).map(SelectedItem::Area),
        }
    }

    #[must_use]
    pub fn is_selected(&self, kind: EntityKind, id: EntityId) -> bool {
        self.selection == Some(Selection { id, kind })
    }

    fn loaded(&mut self, board: BoardSummary, notes: Vec<StickyNote>, areas: Vec<Area>) {
        self.board = Some(board);
        self.doc.load_snapshot(notes, areas);
        self.load = LoadState::Ready;
        self.selection = None;
    }

    fn failed(&mut self, err: GatewayError) {
        self.board = None;
        self.doc.clear();
        self.selection = None;
        self.load = LoadState::Failed(err);
    }

    fn remove(&mut self, kind: EntityKind, id: EntityId) {
        match kind {
            EntityKind::Note => {
                self.doc.remove_note(&id);
            }
            EntityKind::Area => {
                self.doc.remove_area(&id);
            }
        }
        if self.selection.is_some_and(|s| s.id == id) {
            self.selection = None;
        }
    }

    /// Draft for the next new note, cascading from the top-left.
    #[must_use]
    pub fn note_draft(&self) -> NewNote {
        let step = i32::try_from(self.doc.note_count()).unwrap_or(i32::MAX / 40) * 20;
        NewNote {
            content: "新しい付箋".into(),
            color: NOTE_PALETTE[0].1.into(),
            due_at: None,
            x: 120 + step,
            y: 140 + step,
            width: 220,
            height: 160,
        }
    }

    /// Draft for the next new area.
    #[must_use]
    pub fn area_draft(&self) -> NewArea {
        let step = i32::try_from(self.doc.area_count()).unwrap_or(i32::MAX / 48) * 24;
        NewArea { title: "新しいエリア".into(), x: 100 + step, y: 120 + step, width: 360, height: 220 }
    }
}

// ── Confirmation ────────────────────────────────────────────────

/// A mutation waiting for the user's OK.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    UpdateNote { id: EntityId, patch: NotePatch },
    UpdateArea { id: EntityId, patch: AreaPatch },
    DeleteNote { id: EntityId },
    DeleteArea { id: EntityId },
}

/// Prompt shown before a content edit or delete.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmRequest {
    pub action: PendingAction,
}

impl ConfirmRequest {
    /// Deletes get the destructive button treatment.
    #[must_use]
    pub fn destructive(&self) -> bool {
        matches!(self.action, PendingAction::DeleteNote { .. } | PendingAction::DeleteArea { .. })
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self.action {
            PendingAction::UpdateNote { .. } => "付箋を更新しますか？",
            PendingAction::UpdateArea { .. } => "エリアを更新しますか？",
            PendingAction::DeleteNote { .. } => "付箋を削除しますか？この操作は取り消せません。",
            PendingAction::DeleteArea { .. } => "エリアを削除しますか？この操作は取り消せません。",
        }
    }
}

/// Result of resolving a [`ConfirmRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Cancelled,
    /// Applied; carries the success toast text.
    Applied(&'static str),
}

fn validate_note_patch(patch: &NotePatch) -> Result<(), StoreError> {
    if let Some(color) = &patch.color {
        if color.trim().is_empty() {
            return Err(StoreError::Invalid { field: "color", message: "色を選択してください" });
        }
        if color.chars().count() > 32 {
            return Err(StoreError::Invalid { field: "color", message: "色は32文字以内で入力してください" });
        }
    }
    Ok(())
}

fn validate_area_patch(patch: &AreaPatch) -> Result<(), StoreError> {
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(StoreError::Invalid { field: "title", message: "タイトルを入力してください" });
        }
        if title.chars().count() > 255 {
            return Err(StoreError::Invalid { field: "title", message: "タイトルは255文字以内で入力してください" });
        }
    }
    Ok(())
}

// ── Controller ──────────────────────────────────────────────────

/// Top-level state owner for one board view.
pub struct BoardController<G> {
    gateway: G,
    board_id: EntityId,
    store: CanvasStore,
    liveness: Liveness,
}

impl<G: BoardGateway> BoardController<G> {
    #[must_use]
    pub fn new(gateway: G, board_id: EntityId) -> Self {
        Self { gateway, board_id, store: CanvasStore::new(), liveness: Liveness::new() }
    }

    #[must_use]
    pub fn store(&self) -> &CanvasStore {
        &self.store
    }

    #[must_use]
    pub fn board_id(&self) -> EntityId {
        self.board_id
    }

    /// Handle the host clones into its teardown hook.
    #[must_use]
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    fn ensure_alive(&self) -> Result<(), StoreError> {
        if self.liveness.is_alive() { Ok(()) } else { Err(StoreError::Unmounted) }
    }

    /// Fetch the board and its children once.
    pub async fn open(&mut self) -> Result<(), StoreError> {
        self.ensure_alive()?;
        let result = self.gateway.board_detail(self.board_id).await;
        self.ensure_alive()?;
        match result {
            Ok(detail) => {
                log::debug!("board {} loaded: {} notes, {} areas", self.board_id, detail.sticky_notes.len(), detail.areas.len());
                self.store.loaded(detail.board, detail.sticky_notes, detail.areas);
                Ok(())
            }
            Err(err) => {
                log::warn!("board {} failed to load: {err}", self.board_id);
                self.store.failed(err.clone());
                Err(err.into())
            }
        }
    }

    pub fn select(&mut self, kind: EntityKind, id: EntityId) -> bool {
        self.store.select(kind, id)
    }

    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
    }

    /// Create a note from the next draft. The note appears only once the
    /// server has assigned its id.
    pub async fn create_note(&mut self) -> Result<EntityId, StoreError> {
        let draft = self.store.note_draft();
        let result = self.gateway.create_note(self.board_id, &draft).await;
        self.ensure_alive()?;
        let note = result?;
        let id = note.id;
        self.store.doc.upsert_note(note);
        Ok(id)
    }

    pub async fn create_area(&mut self) -> Result<EntityId, StoreError> {
        let draft = self.store.area_draft();
        let result = self.gateway.create_area(self.board_id, &draft).await;
        self.ensure_alive()?;
        let area = result?;
        let id = area.id;
        self.store.doc.upsert_area(area);
        Ok(id)
    }

    /// Route the single outcome of a finished gesture.
    pub async fn apply_gesture(&mut self, kind: EntityKind, id: EntityId, outcome: GestureOutcome) -> Result<(), StoreError> {
        match (kind, outcome) {
            (_, GestureOutcome::None) => Ok(()),
            (_, GestureOutcome::Select) => {
                if self.store.select(kind, id) { Ok(()) } else { Err(StoreError::UnknownEntity { kind, id }) }
            }
            (EntityKind::Note, GestureOutcome::Move { x, y }) => self.patch_note_geometry(id, NotePatch::position(x, y)).await,
            (EntityKind::Note, GestureOutcome::Resize(rect)) => self.patch_note_geometry(id, NotePatch::geometry(rect)).await,
            (EntityKind::Area, GestureOutcome::Move { x, y }) => self.patch_area_geometry(id, AreaPatch::position(x, y)).await,
            (EntityKind::Area, GestureOutcome::Resize(rect)) => self.patch_area_geometry(id, AreaPatch::geometry(rect)).await,
        }
    }

    async fn patch_note_geometry(&mut self, id: EntityId, patch: NotePatch) -> Result<(), StoreError> {
        let previous = self.store.doc.note(&id).cloned().ok_or(StoreError::UnknownEntity { kind: EntityKind::Note, id })?;
        self.store.doc.patch_note(&id, &patch);

        let result = self.gateway.update_note(id, &patch).await;
        self.ensure_alive()?;
        match result {
            Ok(server) => {
                self.store.doc.upsert_note(server);
                Ok(())
            }
            Err(err) => {
                log::warn!("note {id} geometry update failed, rolling back: {err}");
                self.store.doc.upsert_note(previous);
                Err(err.into())
            }
        }
    }

    async fn patch_area_geometry(&mut self, id: EntityId, patch: AreaPatch) -> Result<(), StoreError> {
        let previous = self.store.doc.area(&id).cloned().ok_or(StoreError::UnknownEntity { kind: EntityKind::Area, id })?;
        self.store.doc.patch_area(&id, &patch);

        let result = self.gateway.update_area(id, &patch).await;
        self.ensure_alive()?;
        match result {
            Ok(server) => {
                self.store.doc.upsert_area(server);
                Ok(())
            }
            Err(err) => {
                log::warn!("area {id} geometry update failed, rolling back: {err}");
                self.store.doc.upsert_area(previous);
                Err(err.into())
            }
        }
    }

    /// Ask to save a note edit. Geometry-only patches should go through
    /// [`Self::apply_gesture`] instead; they never need confirmation.
    pub fn request_note_update(&self, id: EntityId, patch: NotePatch) -> Result<ConfirmRequest, StoreError> {
        if !self.store.doc.contains(EntityKind::Note, &id) {
            return Err(StoreError::UnknownEntity { kind: EntityKind::Note, id });
        }
        validate_note_patch(&patch)?;
        Ok(ConfirmRequest { action: PendingAction::UpdateNote { id, patch } })
    }

    pub fn request_area_update(&self, id: EntityId, patch: AreaPatch) -> Result<ConfirmRequest, StoreError> {
        if !self.store.doc.contains(EntityKind::Area, &id) {
            return Err(StoreError::UnknownEntity { kind: EntityKind::Area, id });
        }
        validate_area_patch(&patch)?;
        Ok(ConfirmRequest { action: PendingAction::UpdateArea { id, patch } })
    }

    pub fn request_delete(&self, kind: EntityKind, id: EntityId) -> Result<ConfirmRequest, StoreError> {
        if !self.store.doc.contains(kind, &id) {
            return Err(StoreError::UnknownEntity { kind, id });
        }
        let action = match kind {
            EntityKind::Note => PendingAction::DeleteNote { id },
            EntityKind::Area => PendingAction::DeleteArea { id },
        };
        Ok(ConfirmRequest { action })
    }

    /// Run (or drop) a confirmed action. The store changes only after the
    /// server reports success.
    pub async fn resolve(&mut self, request: ConfirmRequest, accepted: bool) -> Result<Resolution, StoreError> {
        if !accepted {
            return Ok(Resolution::Cancelled);
        }
        match request.action {
            PendingAction::UpdateNote { id, patch } => {
                let result = self.gateway.update_note(id, &patch).await;
                self.ensure_alive()?;
                let note = result?;
                self.store.doc.upsert_note(note);
                Ok(Resolution::Applied("付箋を更新しました"))
            }
            PendingAction::UpdateArea { id, patch } => {
                let result = self.gateway.update_area(id, &patch).await;
                self.ensure_alive()?;
                let area = result?;
                self.store.doc.upsert_area(area);
                Ok(Resolution::Applied("エリアを更新しました"))
            }
            PendingAction::DeleteNote { id } => {
                let result = self.gateway.delete_note(id).await;
                self.ensure_alive()?;
                result?;
                self.store.remove(EntityKind::Note, id);
                Ok(Resolution::Applied("付箋を削除しました"))
            }
            PendingAction::DeleteArea { id } => {
                let result = self.gateway.delete_area(id).await;
                self.ensure_alive()?;
                result?;
                self.store.remove(EntityKind::Area, id);
                Ok(Resolution::Applied("エリアを削除しました"))
            }
        }
    }

    /// Component teardown.
    pub fn unmount(&mut self) {
        self.liveness.unmount();
    }
}
