//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use livedoc_core::{Room, RoomId, RoomPage};
use livedoc_rooms::RoomBackend;

use crate::cache::{PageCache, ROOT_PATH, document_path};
use crate::config::ServerConfig;
use crate::events::EventBroadcaster;

/// Application state shared across all handlers.
///
/// This is cloneable and can be extracted in handlers using `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Room backend (collaboration service).
    backend: Arc<dyn RoomBackend>,
    /// Server configuration.
    config: Arc<ServerConfig>,
    /// Cached rooms, under `/document/{id}`.
    rooms: PageCache<Room>,
    /// Cached per-user listings, under `/`.
    listings: PageCache<RoomPage>,
    /// Event broadcaster for SSE notifications.
    broadcaster: Arc<EventBroadcaster>,
}

impl AppState {
    /// Create new application state.
    pub fn new(backend: Arc<dyn RoomBackend>, config: ServerConfig) -> Self {
        let max_age = Duration::from_secs(config.page_cache_max_age_secs);
        Self {
            backend,
            config: Arc::new(config),
            rooms: PageCache::new(max_age),
            listings: PageCache::new(max_age),
            broadcaster: Arc::new(EventBroadcaster::new()),
        }
    }

    /// Get a reference to the room backend.
    pub fn backend(&self) -> &dyn RoomBackend {
        self.backend.as_ref()
    }

    /// Get a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Cached rooms keyed by document path.
    pub fn rooms(&self) -> &PageCache<Room> {
        &self.rooms
    }

    /// Cached listings keyed by user.
    pub fn listings(&self) -> &PageCache<RoomPage> {
        &self.listings
    }

    /// Get a reference to the event broadcaster.
    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    /// Invalidate every user's document listing.
    pub fn revalidate_root(&self) {
        self.listings.invalidate_path(ROOT_PATH);
    }

    /// Invalidate a document's page and tell its subscribers.
    pub async fn revalidate_document(&self, room_id: &RoomId) {
        let path = document_path(room_id);
        self.rooms.invalidate_path(&path);
        self.broadcaster.publish_revalidate(room_id, &path).await;
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
