//! Shared numeric constants for the canvas crate.

// ── Gestures ────────────────────────────────────────────────────

/// Pointer travel (per axis, in client pixels) beyond which a press becomes a drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// Minimum width/height for a resized entity in the simple case.
pub const MIN_ENTITY_SIZE_PX: f64 = 100.0;

/// Minimum area width on the full board editor.
pub const MIN_AREA_WIDTH_PX: f64 = 160.0;

/// Minimum area height on the full board editor.
pub const MIN_AREA_HEIGHT_PX: f64 = 120.0;

// ── Notification polling ────────────────────────────────────────

/// Interval for the latest-notification poll.
pub const POLL_INTERVAL_MS: u64 = 5_000;

/// Interval for the identity / unread-count refresh.
pub const HEADER_REFRESH_MS: u64 = 30_000;

/// How long a new-notification snack stays up before dismissing itself.
pub const SNACK_DISMISS_MS: u64 = 6_000;

/// Session storage key holding the last notification id this session has seen.
pub const LATEST_NOTIFICATION_KEY: &str = "latest_notification_id";
