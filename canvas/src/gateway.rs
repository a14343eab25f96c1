//! Network seam between the canvas and the StickyBoard HTTP API.
//!
//! The host implements these traits over `fetch`; tests implement them over
//! in-memory maps. Futures are `?Send` because the browser is single-threaded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::doc::{Area, AreaPatch, BoardDetail, EntityId, NewArea, NewNote, NotePatch, StickyNote};

/// Failure reported by a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Missing, deleted, or owned by someone else.
    #[error("not found")]
    NotFound,
    /// Session expired; the host should redirect to login.
    #[error("unauthenticated")]
    Unauthorized,
    /// Server rejected the payload; `field` names the first offending field.
    #[error("validation failed on {field}: {message}")]
    Validation { field: String, message: String },
    /// Network or unexpected server failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Board detail and child CRUD.
#[async_trait(?Send)]
pub trait BoardGateway {
    async fn board_detail(&self, board_id: EntityId) -> Result<BoardDetail, GatewayError>;

    async fn create_note(&self, board_id: EntityId, note: &NewNote) -> Result<StickyNote, GatewayError>;

    async fn update_note(&self, note_id: EntityId, patch: &NotePatch) -> Result<StickyNote, GatewayError>;

    async fn delete_note(&self, note_id: EntityId) -> Result<(), GatewayError>;

    async fn create_area(&self, board_id: EntityId, area: &NewArea) -> Result<Area, GatewayError>;

    async fn update_area(&self, area_id: EntityId, patch: &AreaPatch) -> Result<Area, GatewayError>;

    async fn delete_area(&self, area_id: EntityId) -> Result<(), GatewayError>;
}

/// One notification in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: EntityId,
    pub message: String,
    pub board_id: EntityId,
    pub sticky_note_id: Option<EntityId>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A page of the feed, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPage {
    pub data: Vec<NotificationItem>,
    pub has_more: bool,
}

/// Signed-in identity for the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Me {
    pub name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: Option<String>,
    pub unread_count: i64,
}

/// Notification feed and identity endpoints.
#[async_trait(?Send)]
pub trait NotificationFeed {
    async fn notifications(&self, page: u32, per_page: u32) -> Result<NotificationPage, GatewayError>;

    async fn mark_read(&self, notification_id: EntityId) -> Result<NotificationItem, GatewayError>;

    async fn me(&self) -> Result<Me, GatewayError>;
}
