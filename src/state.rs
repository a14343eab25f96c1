//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the database pool, the loaded configuration, and the sender side of
//! the avatar job queue. The queue is `None` when no worker is running (tests
//! and the one-shot CLI commands); profile uploads are then refused.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::services::avatar::AvatarJob;

/// Shared application state. Clone is required by Axum; every field is
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub avatar_tx: Option<mpsc::Sender<AvatarJob>>,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, config: Arc<AppConfig>, avatar_tx: Option<mpsc::Sender<AvatarJob>>) -> Self {
        Self { pool, config, avatar_tx }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
