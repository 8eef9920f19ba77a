//! The room backend seam.

use std::sync::Arc;

use async_trait::async_trait;
use livedoc_core::{InboxNotification, NewRoom, Room, RoomId, RoomPage, RoomUpdate};
use serde::Serialize;

use crate::config::{BackendKind, RoomsConfig};
use crate::error::RoomsResult;
use crate::liveblocks::LiveblocksClient;
use crate::memory::MemoryBackend;

/// Default page size for room listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size the service accepts.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Filter for listing rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    /// Only rooms whose access map contains this user (email).
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Cursor returned by the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_after: Option<String>,
}

impl RoomQuery {
    /// All rooms `user_id` participates in, first page.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            limit: None,
            starting_after: None,
        }
    }

    /// Page size clamped to the accepted range.
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }
}

/// Operations on rooms in the collaboration service.
///
/// Every method is a single remote call; nothing is retried.
#[async_trait]
pub trait RoomBackend: Send + Sync {
    /// Create a room. Fails if the id is taken.
    async fn create_room(&self, room: &NewRoom) -> RoomsResult<Room>;

    /// Fetch a room by id.
    async fn get_room(&self, room_id: &RoomId) -> RoomsResult<Room>;

    /// Patch a room's metadata and/or access map, returning the updated room.
    async fn update_room(&self, room_id: &RoomId, update: &RoomUpdate) -> RoomsResult<Room>;

    /// Delete a room.
    async fn delete_room(&self, room_id: &RoomId) -> RoomsResult<()>;

    /// List rooms matching `query`.
    async fn get_rooms(&self, query: &RoomQuery) -> RoomsResult<RoomPage>;

    /// Deliver a notification to a user's inbox.
    async fn trigger_inbox_notification(&self, notification: &InboxNotification)
        -> RoomsResult<()>;
}

/// Build the backend selected by `config`.
pub fn connect(config: &RoomsConfig) -> RoomsResult<Arc<dyn RoomBackend>> {
    match config.backend {
        BackendKind::Liveblocks => {
            tracing::info!(api_url = %config.api_url, "Using Liveblocks room backend");
            Ok(Arc::new(LiveblocksClient::new(config)?))
        }
        BackendKind::Memory => {
            tracing::warn!("Using in-memory room backend, rooms are lost on restart");
            Ok(Arc::new(MemoryBackend::new()))
        }
    }
}
