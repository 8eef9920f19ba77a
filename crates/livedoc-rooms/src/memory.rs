//! In-memory room backend.
//!
//! Behaves like the collaboration service for the operations LiveDoc uses:
//! duplicate ids are rejected with 409, unknown rooms yield
//! [`RoomsError::RoomNotFound`], updates are merged the way the service merges
//! them, and listings are paginated by room id cursor.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use livedoc_core::{InboxNotification, NewRoom, Room, RoomId, RoomPage, RoomUpdate};
use tokio::sync::RwLock;

use crate::backend::{RoomBackend, RoomQuery};
use crate::error::{RoomsError, RoomsResult};

/// Rooms and delivered notifications held in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rooms: RwLock<BTreeMap<RoomId, Room>>,
    notifications: RwLock<Vec<InboxNotification>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications delivered so far, oldest first.
    pub async fn notifications(&self) -> Vec<InboxNotification> {
        self.notifications.read().await.clone()
    }

    /// Number of rooms currently stored.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[async_trait]
impl RoomBackend for MemoryBackend {
    async fn create_room(&self, room: &NewRoom) -> RoomsResult<Room> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room.id) {
            return Err(RoomsError::Status {
                status: 409,
                message: format!("room {} already exists", room.id),
            });
        }

        let created = Room::from_new(room.clone(), Utc::now());
        rooms.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn get_room(&self, room_id: &RoomId) -> RoomsResult<Room> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomsError::RoomNotFound(room_id.clone()))
    }

    async fn update_room(&self, room_id: &RoomId, update: &RoomUpdate) -> RoomsResult<Room> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomsError::RoomNotFound(room_id.clone()))?;
        room.apply_update(update);
        Ok(room.clone())
    }

    async fn delete_room(&self, room_id: &RoomId) -> RoomsResult<()> {
        self.rooms
            .write()
            .await
            .remove(room_id)
            .map(|_| ())
            .ok_or_else(|| RoomsError::RoomNotFound(room_id.clone()))
    }

    async fn get_rooms(&self, query: &RoomQuery) -> RoomsResult<RoomPage> {
        let rooms = self.rooms.read().await;
        let limit = query.effective_limit() as usize;

        let mut matching = rooms
            .values()
            .filter(|room| room.has_access(&query.user_id))
            .filter(|room| match &query.starting_after {
                Some(cursor) => room.id.as_str() > cursor.as_str(),
                None => true,
            });

        let data: Vec<Room> = matching.by_ref().take(limit).cloned().collect();
        let next_cursor = match matching.next() {
            Some(_) => data.last().map(|room| room.id.to_string()),
            None => None,
        };

        Ok(RoomPage { next_cursor, data })
    }

    async fn trigger_inbox_notification(
        &self,
        notification: &InboxNotification,
    ) -> RoomsResult<()> {
        self.notifications.write().await.push(notification.clone());
        Ok(())
    }
}
