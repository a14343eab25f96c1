//! Input model: mouse buttons, resize handles, and the per-entity gesture state machine.
//!
//! `EntityGesture` tracks one note or area between pointer-down and
//! pointer-up. While a gesture is live the host keeps document-level
//! move/up listeners attached (see [`EntityGesture::is_capturing`]) and
//! renders [`EntityGesture::render_rect`]; nothing is written to the store
//! or the network until release, when exactly one [`GestureOutcome`] is
//! produced.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::{DRAG_THRESHOLD_PX, MIN_AREA_HEIGHT_PX, MIN_AREA_WIDTH_PX, MIN_ENTITY_SIZE_PX};
use crate::doc::{EntityId, EntityKind};
use crate::geom::{IntRect, Point, Rect};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// Resize handle position on the entity's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeHandle {
    pub const ALL: [Self; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Parse a compass identifier (`"n"`, `"se"`, ...).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "n" => Some(Self::N),
            "ne" => Some(Self::Ne),
            "e" => Some(Self::E),
            "se" => Some(Self::Se),
            "s" => Some(Self::S),
            "sw" => Some(Self::Sw),
            "w" => Some(Self::W),
            "nw" => Some(Self::Nw),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::N => "n",
            Self::Ne => "ne",
            Self::E => "e",
            Self::Se => "se",
            Self::S => "s",
            Self::Sw => "sw",
            Self::W => "w",
            Self::Nw => "nw",
        }
    }

    fn north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    fn south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    fn east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    fn west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }
}

/// Minimum size enforced while resizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeLimits {
    pub min_width: f64,
    pub min_height: f64,
}

impl ResizeLimits {
    /// Square floor used for plain entities.
    pub const SIMPLE: Self = Self { min_width: MIN_ENTITY_SIZE_PX, min_height: MIN_ENTITY_SIZE_PX };
    /// Floor used for areas in the board editor.
    pub const AREA: Self = Self { min_width: MIN_AREA_WIDTH_PX, min_height: MIN_AREA_HEIGHT_PX };

    /// Default limits for an entity kind.
    #[must_use]
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Note => Self::SIMPLE,
            EntityKind::Area => Self::AREA,
        }
    }
}

impl Default for ResizeLimits {
    fn default() -> Self {
        Self::SIMPLE
    }
}

/// Compute the rectangle produced by dragging `handle` by `(dx, dy)` from `start`.
///
/// East/south handles grow the size; west/north handles shrink it and shift
/// the origin by the same amount so the opposite edge stays put. Sizes never
/// drop below `limits`.
#[must_use]
pub fn resize_rect(start: Rect, handle: ResizeHandle, dx: f64, dy: f64, limits: ResizeLimits) -> Rect {
    let mut next = start;
    if handle.east() {
        next.width = (start.width + dx).max(limits.min_width);
    }
    if handle.south() {
        next.height = (start.height + dy).max(limits.min_height);
    }
    if handle.west() {
        let width = (start.width - dx).max(limits.min_width);
        next.width = width;
        next.x = start.x + (start.width - width);
    }
    if handle.north() {
        let height = (start.height - dy).max(limits.min_height);
        next.height = height;
        next.y = start.y + (start.height - height);
    }
    next
}

/// Internal state for the gesture state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user pressed on the entity body and may be moving it.
    Dragging {
        /// Client-space pointer position at pointer-down.
        start_pointer: Point,
        /// Entity rectangle at pointer-down.
        start_rect: Rect,
        /// Set once either axis has travelled beyond the drag threshold.
        has_moved: bool,
    },
    /// The user is dragging one of the eight resize handles.
    Resizing {
        handle: ResizeHandle,
        start_pointer: Point,
        start_rect: Rect,
    },
}

/// What a completed gesture asks the board controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Nothing happened (no gesture was live).
    None,
    /// A press without real movement: select the entity.
    Select,
    /// A drag: persist the new rounded position.
    Move { x: i32, y: i32 },
    /// A resize: persist the new rounded rectangle.
    Resize(IntRect),
}

/// Pointer-driven move/resize for a single note or area.
#[derive(Debug, Clone)]
pub struct EntityGesture {
    id: EntityId,
    kind: EntityKind,
    limits: ResizeLimits,
    /// Last rectangle known from the store.
    base: Rect,
    /// Local position while a gesture is live.
    transient: Option<Rect>,
    input: InputState,
}

impl EntityGesture {
    #[must_use]
    pub fn new(kind: EntityKind, id: EntityId, rect: IntRect) -> Self {
        Self {
            id,
            kind,
            limits: ResizeLimits::for_kind(kind),
            base: rect.into(),
            transient: None,
            input: InputState::Idle,
        }
    }

    /// Override the resize floor.
    #[must_use]
    pub fn with_limits(mut self, limits: ResizeLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    #[must_use]
    pub fn state(&self) -> &InputState {
        &self.input
    }

    /// Whether document-level move/up listeners should be attached.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        !matches!(self.input, InputState::Idle)
    }

    /// Rectangle to draw this frame.
    #[must_use]
    pub fn render_rect(&self) -> Rect {
        self.transient.unwrap_or(self.base)
    }

    /// Adopt the store's rectangle. Ignored mid-gesture so a server echo
    /// cannot yank the entity out from under the pointer.
    pub fn sync(&mut self, rect: IntRect) {
        if !self.is_capturing() {
            self.base = rect.into();
        }
    }

    /// Pointer pressed on the entity body. Returns true if a drag began.
    pub fn pointer_down(&mut self, button: Button, client: Point) -> bool {
        if button != Button::Primary || self.is_capturing() {
            return false;
        }
        let start_rect = self.render_rect();
        self.input = InputState::Dragging { start_pointer: client, start_rect, has_moved: false };
        self.transient = Some(start_rect);
        true
    }

    /// Pointer pressed on a resize handle. Handles exist only on the
    /// selected entity, so presses while unselected are ignored.
    pub fn handle_down(&mut self, handle: ResizeHandle, button: Button, client: Point, selected: bool) -> bool {
        if !selected || button != Button::Primary || self.is_capturing() {
            return false;
        }
        let start_rect = self.render_rect();
        self.input = InputState::Resizing { handle, start_pointer: client, start_rect };
        self.transient = Some(start_rect);
        true
    }

    /// Pointer moved anywhere on the document. Returns the new transient
    /// rectangle, or `None` when no gesture is live.
    pub fn pointer_move(&mut self, client: Point) -> Option<Rect> {
        let next = match &mut self.input {
            InputState::Idle => return None,
            InputState::Dragging { start_pointer, start_rect, has_moved } => {
                let (dx, dy) = client.delta_from(*start_pointer);
                if dx.abs() > DRAG_THRESHOLD_PX || dy.abs() > DRAG_THRESHOLD_PX {
                    *has_moved = true;
                }
                start_rect.translated(dx, dy)
            }
            InputState::Resizing { handle, start_pointer, start_rect } => {
                let (dx, dy) = client.delta_from(*start_pointer);
                resize_rect(*start_rect, *handle, dx, dy, self.limits)
            }
        };
        self.transient = Some(next);
        Some(next)
    }

    /// Pointer released. Applies the final position, leaves capture, and
    /// reports the single outcome for this gesture.
    pub fn pointer_up(&mut self, client: Point) -> GestureOutcome {
        if self.pointer_move(client).is_none() {
            return GestureOutcome::None;
        }
        let finished = std::mem::take(&mut self.input);
        let last = self.transient.take().unwrap_or(self.base);

        match finished {
            InputState::Idle => GestureOutcome::None,
            InputState::Dragging { has_moved: false, .. } => GestureOutcome::Select,
            InputState::Dragging { has_moved: true, .. } => {
                let rounded = last.rounded();
                self.base = Rect::from(rounded);
                GestureOutcome::Move { x: rounded.x, y: rounded.y }
            }
            InputState::Resizing { .. } => {
                let rounded = last.rounded();
                self.base = Rect::from(rounded);
                GestureOutcome::Resize(rounded)
            }
        }
    }

    /// Abort any live gesture (component teardown). Drops the transient
    /// position and releases capture without producing an outcome.
    pub fn cancel(&mut self) {
        self.input = InputState::Idle;
        self.transient = None;
    }
}
