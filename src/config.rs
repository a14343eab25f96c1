//! Runtime configuration loaded from the environment.
//!
//! DESIGN
//! ======
//! Every knob has a default except `DATABASE_URL`. Values that fail to parse
//! fall back to their default rather than aborting startup. Google login is
//! optional: when any of its three variables is missing the auth routes
//! answer 503 and the rest of the API keeps working.

use std::path::PathBuf;

use crate::services::auth::GoogleConfig;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_OVERDUE_SCAN_INTERVAL_SECS: u64 = 60;
const DEFAULT_OVERDUE_SCAN_BATCH_SIZE: i64 = 100;
const DEFAULT_STORAGE_DIR: &str = "./storage";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_AVATAR_SIZE_PX: u32 = 256;
const DEFAULT_AVATAR_MAX_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_AVATAR_QUEUE_CAPACITY: usize = 64;
const DEFAULT_AVATAR_JOB_RETRIES: usize = 3;
const DEFAULT_AVATAR_RETRY_BASE_MS: u64 = 500;
const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Tuning for the avatar processing worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarConfig {
    /// Edge length of the square thumbnail.
    pub size_px: u32,
    /// Uploads larger than this are rejected before queuing.
    pub max_bytes: usize,
    pub queue_capacity: usize,
    /// Attempts per job on transient database failures.
    pub retries: usize,
    /// Linear back-off step between attempts.
    pub retry_base_ms: u64,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            size_px: DEFAULT_AVATAR_SIZE_PX,
            max_bytes: DEFAULT_AVATAR_MAX_BYTES,
            queue_capacity: DEFAULT_AVATAR_QUEUE_CAPACITY,
            retries: DEFAULT_AVATAR_JOB_RETRIES,
            retry_base_ms: DEFAULT_AVATAR_RETRY_BASE_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub overdue_scan_interval_secs: u64,
    pub overdue_scan_batch_size: i64,
    /// Root for uploads; `tmp/` holds pending avatars, `public/` is served at `/storage`.
    pub storage_dir: PathBuf,
    pub public_base_url: String,
    pub avatar: AvatarConfig,
    pub session_ttl_days: i64,
    pub cookie_secure: bool,
    pub google: Option<GoogleConfig>,
}

impl AppConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `DATABASE_URL` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let google = GoogleConfig::from_env();
        let cookie_secure = env_bool("COOKIE_SECURE")
            .unwrap_or_else(|| google.as_ref().is_some_and(|g| g.redirect_uri.starts_with("https://")));

        Ok(Self {
            database_url,
            port: env_parse("PORT", DEFAULT_PORT),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            overdue_scan_interval_secs: env_parse("OVERDUE_SCAN_INTERVAL_SECS", DEFAULT_OVERDUE_SCAN_INTERVAL_SECS),
            overdue_scan_batch_size: env_parse("OVERDUE_SCAN_BATCH_SIZE", DEFAULT_OVERDUE_SCAN_BATCH_SIZE).max(1),
            storage_dir: std::env::var("STORAGE_DIR").map_or_else(|_| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            avatar: AvatarConfig {
                size_px: env_parse("AVATAR_SIZE_PX", DEFAULT_AVATAR_SIZE_PX).max(1),
                max_bytes: env_parse("AVATAR_MAX_BYTES", DEFAULT_AVATAR_MAX_BYTES),
                queue_capacity: env_parse("AVATAR_QUEUE_CAPACITY", DEFAULT_AVATAR_QUEUE_CAPACITY).max(1),
                retries: env_parse("AVATAR_JOB_RETRIES", DEFAULT_AVATAR_JOB_RETRIES).max(1),
                retry_base_ms: env_parse("AVATAR_RETRY_BASE_MS", DEFAULT_AVATAR_RETRY_BASE_MS),
            },
            session_ttl_days: env_parse("SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS),
            cookie_secure,
            google,
        })
    }

    /// Configuration for tests and tools that never touch the network.
    #[must_use]
    pub fn for_database(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_owned(),
            port: DEFAULT_PORT,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            overdue_scan_interval_secs: DEFAULT_OVERDUE_SCAN_INTERVAL_SECS,
            overdue_scan_batch_size: DEFAULT_OVERDUE_SCAN_BATCH_SIZE,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_owned(),
            avatar: AvatarConfig::default(),
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            cookie_secure: false,
            google: None,
        }
    }

    /// Directory for uploads awaiting processing.
    #[must_use]
    pub fn tmp_dir(&self) -> PathBuf {
        self.storage_dir.join("tmp")
    }

    /// Directory served at `/storage`.
    #[must_use]
    pub fn public_dir(&self) -> PathBuf {
        self.storage_dir.join("public")
    }

    #[must_use]
    pub fn avatar_dir(&self) -> PathBuf {
        self.public_dir().join("avatars")
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
