//! Active-session notification polling.
//!
//! The host calls [`NotificationPoller::run_due`] from a single timer
//! callback with the current clock (`performance.now()` in the browser).
//! Two schedules share that callback:
//!
//! - every `POLL_INTERVAL_MS`, fetch page 1 with size 1 and compare the
//!   newest id against the one remembered in session storage
//! - every `HEADER_REFRESH_MS`, refresh `me()` for the name, avatar and
//!   unread badge
//!
//! Poll failures are logged and left for the next tick. After
//! [`NotificationPoller::teardown`] nothing is due and late results are
//! discarded.

#[cfg(test)]
#[path = "poll_test.rs"]
mod poll_test;

use std::collections::HashMap;

use crate::consts::{HEADER_REFRESH_MS, LATEST_NOTIFICATION_KEY, POLL_INTERVAL_MS, SNACK_DISMISS_MS};
use crate::doc::EntityId;
use crate::gateway::{GatewayError, Me, NotificationFeed, NotificationItem};

/// Session-scoped key/value storage (browser `sessionStorage`).
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory storage for hosts without `sessionStorage`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }
}

/// Transient alert for a newly arrived notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snack {
    pub notification: NotificationItem,
    /// Host clock value after which the snack hides itself.
    pub dismiss_at_ms: u64,
}

/// Where a clicked notification leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationTarget {
    pub board_id: EntityId,
    /// Note to scroll to and highlight, when it still exists.
    pub sticky_note_id: Option<EntityId>,
}

/// Outcome of one feed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// First observation this session; baseline recorded silently.
    Baseline,
    /// Nothing new.
    Unchanged,
    /// Newest notification changed and is unread; a snack is showing.
    Alerted,
    /// Newest notification changed but is already read.
    SeenElsewhere,
    /// Request failed; retried on the next tick.
    Failed,
    /// Poller was torn down.
    Stopped,
}

/// Two-schedule timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimers {
    next_poll_ms: u64,
    next_header_ms: u64,
    cancelled: bool,
}

impl PollTimers {
    /// Both schedules fire immediately, then on their intervals.
    #[must_use]
    pub fn start(now_ms: u64) -> Self {
        Self { next_poll_ms: now_ms, next_header_ms: now_ms, cancelled: false }
    }

    fn take_poll(&mut self, now_ms: u64) -> bool {
        if self.cancelled || now_ms < self.next_poll_ms {
            return false;
        }
        self.next_poll_ms = now_ms + POLL_INTERVAL_MS;
        true
    }

    fn take_header(&mut self, now_ms: u64) -> bool {
        if self.cancelled || now_ms < self.next_header_ms {
            return false;
        }
        self.next_header_ms = now_ms + HEADER_REFRESH_MS;
        true
    }

    /// Earliest clock value at which something is due, or `None` once cancelled.
    #[must_use]
    pub fn next_due_ms(&self) -> Option<u64> {
        if self.cancelled { None } else { Some(self.next_poll_ms.min(self.next_header_ms)) }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

pub struct NotificationPoller<F, S> {
    feed: F,
    storage: S,
    timers: PollTimers,
    snack: Option<Snack>,
    me: Option<Me>,
    login_required: bool,
}

impl<F: NotificationFeed, S: SessionStorage> NotificationPoller<F, S> {
    #[must_use]
    pub fn new(feed: F, storage: S, now_ms: u64) -> Self {
        Self { feed, storage, timers: PollTimers::start(now_ms), snack: None, me: None, login_required: false }
    }

    #[must_use]
    pub fn snack(&self) -> Option<&Snack> {
        self.snack.as_ref()
    }

    #[must_use]
    pub fn me(&self) -> Option<&Me> {
        self.me.as_ref()
    }

    /// Set when `me()` reports the session has expired; the host redirects to login.
    #[must_use]
    pub fn login_required(&self) -> bool {
        self.login_required
    }

    #[must_use]
    pub fn timers(&self) -> &PollTimers {
        &self.timers
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Run whatever is due at `now_ms` and hide an expired snack.
    pub async fn run_due(&mut self, now_ms: u64) -> Option<PollOutcome> {
        self.expire_snack(now_ms);
        if self.timers.take_header(now_ms) {
            self.refresh_header().await;
        }
        if self.timers.take_poll(now_ms) {
            return Some(self.poll(now_ms).await);
        }
        None
    }

    /// Fetch the newest notification and compare it with the session baseline.
    pub async fn poll(&mut self, now_ms: u64) -> PollOutcome {
        if self.timers.is_cancelled() {
            return PollOutcome::Stopped;
        }
        let page = match self.feed.notifications(1, 1).await {
            Ok(page) => page,
            Err(err) => {
                log::warn!("notification poll failed: {err}");
                return PollOutcome::Failed;
            }
        };
        if self.timers.is_cancelled() {
            return PollOutcome::Stopped;
        }

        let latest = page.data.into_iter().next();
        let latest_id = latest.as_ref().map(|n| n.id.to_string()).unwrap_or_default();
        let previous = self.storage.get(LATEST_NOTIFICATION_KEY);
        self.storage.set(LATEST_NOTIFICATION_KEY, &latest_id);

        let Some(previous) = previous else {
            return PollOutcome::Baseline;
        };
        let Some(latest) = latest else {
            return PollOutcome::Unchanged;
        };
        if previous == latest_id {
            return PollOutcome::Unchanged;
        }
        if latest.is_read {
            return PollOutcome::SeenElsewhere;
        }
        log::info!("new notification {}", latest.id);
        self.snack = Some(Snack { notification: latest, dismiss_at_ms: now_ms + SNACK_DISMISS_MS });
        PollOutcome::Alerted
    }

    /// Refresh the header identity and unread badge.
    pub async fn refresh_header(&mut self) {
        match self.feed.me().await {
            Ok(me) if !self.timers.is_cancelled() => {
                self.login_required = false;
                self.me = Some(me);
            }
            Ok(_) => {}
            Err(GatewayError::Unauthorized) => {
                self.login_required = true;
                self.me = None;
            }
            Err(err) => log::warn!("header refresh failed: {err}"),
        }
    }

    pub fn expire_snack(&mut self, now_ms: u64) {
        if self.snack.as_ref().is_some_and(|s| now_ms >= s.dismiss_at_ms) {
            self.snack = None;
        }
    }

    pub fn dismiss_snack(&mut self) {
        self.snack = None;
    }

    /// Snack clicked: hide it, mark the notification read, and return where
    /// to navigate. A failed mark-read is logged; navigation still happens.
    pub async fn click_snack(&mut self) -> Option<NavigationTarget> {
        let snack = self.snack.take()?;
        let item = snack.notification;
        match self.feed.mark_read(item.id).await {
            Ok(_) => {
                if let Some(me) = self.me.as_mut() {
                    me.unread_count = (me.unread_count - 1).max(0);
                }
            }
            Err(err) => log::warn!("mark-read for {} failed: {err}", item.id),
        }
        Some(NavigationTarget { board_id: item.board_id, sticky_note_id: item.sticky_note_id })
    }

    /// Page teardown: cancel both schedules.
    pub fn teardown(&mut self) {
        self.timers.cancel();
        self.snack = None;
    }
}
