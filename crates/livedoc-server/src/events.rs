//! Event broadcasting for room subscribers.
//!
//! Clients viewing a document subscribe to its room's events over SSE and
//! refresh their view when told to. Events are published whenever a mutation
//! revalidates a document page or changes someone's access.
//!
//! # Architecture
//!
//! - Uses `tokio::sync::broadcast` for multi-subscriber pub/sub
//! - One channel per room (created lazily on first subscription)
//! - Channels are cleaned up when all subscribers disconnect
//!
//! # Event Types
//!
//! - `revalidate`: The document page changed and should be re-fetched
//! - `access_changed`: A collaborator was added, changed, or removed
//! - `heartbeat`: Sent periodically to keep connections alive
//! - `catchup`: Sent when a subscriber falls behind

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use livedoc_core::{RoomId, UserType};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};

/// Default channel capacity for broadcast channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Heartbeat interval in seconds.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;

// ============================================================================
// Event Types
// ============================================================================

/// An event that can be broadcast to subscribers of a room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A cached page was invalidated.
    Revalidate(RevalidateEvent),
    /// A collaborator's access changed.
    AccessChanged(AccessChangedEvent),
    /// Periodic heartbeat to keep connection alive.
    Heartbeat(HeartbeatEvent),
    /// Client fell behind and should re-fetch the room.
    Catchup(CatchupEvent),
}

impl RoomEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Revalidate(_) => "revalidate",
            Self::AccessChanged(_) => "access_changed",
            Self::Heartbeat(_) => "heartbeat",
            Self::Catchup(_) => "catchup",
        }
    }
}

/// Event data for page invalidation.
#[derive(Debug, Clone, Serialize)]
pub struct RevalidateEvent {
    /// Invalidated page path.
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

/// Event data for an access change.
#[derive(Debug, Clone, Serialize)]
pub struct AccessChangedEvent {
    /// Collaborator whose access changed.
    pub email: String,
    /// New tier, or `None` if the collaborator was removed.
    pub user_type: Option<UserType>,
    /// Email of the user who made the change.
    pub updated_by: String,
    pub timestamp: DateTime<Utc>,
}

/// Heartbeat event data.
///
/// Carries no timestamp: the same keep-alive frame is repeated for the life
/// of the stream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeartbeatEvent {}

/// Catchup event sent when subscriber falls behind.
#[derive(Debug, Clone, Serialize)]
pub struct CatchupEvent {
    /// Number of events missed.
    pub events_missed: u64,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Manages broadcast channels for room events.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    /// Map of room id -> broadcast sender.
    channels: Arc<RwLock<HashMap<RoomId, broadcast::Sender<RoomEvent>>>>,
    /// Channel capacity for new channels.
    capacity: usize,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster {
    /// Create a new event broadcaster with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event broadcaster with custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Subscribe to events for a room, creating its channel if needed.
    pub async fn subscribe(&self, room_id: &RoomId) -> broadcast::Receiver<RoomEvent> {
        {
            let channels = self.channels.read().await;
            if let Some(sender) = channels.get(room_id) {
                return sender.subscribe();
            }
        }

        let mut channels = self.channels.write().await;
        // Another task may have created it between the locks.
        if let Some(sender) = channels.get(room_id) {
            return sender.subscribe();
        }

        let (sender, receiver) = broadcast::channel(self.capacity);
        channels.insert(room_id.clone(), sender);

        tracing::debug!(
            room_id = %room_id,
            capacity = self.capacity,
            "Created event channel for room"
        );

        receiver
    }

    /// Publish an event to all subscribers of a room.
    ///
    /// Returns the number of receivers that got the event, or `None` if
    /// nobody has subscribed to the room.
    pub async fn publish(&self, room_id: &RoomId, event: RoomEvent) -> Option<usize> {
        let channels = self.channels.read().await;
        let sender = channels.get(room_id)?;
        match sender.send(event) {
            Ok(count) => {
                tracing::trace!(room_id = %room_id, receivers = count, "Published room event");
                Some(count)
            }
            Err(_) => Some(0),
        }
    }

    /// Tell subscribers that `path` was invalidated.
    pub async fn publish_revalidate(&self, room_id: &RoomId, path: &str) -> Option<usize> {
        let event = RoomEvent::Revalidate(RevalidateEvent {
            path: path.to_string(),
            timestamp: Utc::now(),
        });
        self.publish(room_id, event).await
    }

    /// Tell subscribers that `email`'s access changed.
    pub async fn publish_access_changed(
        &self,
        room_id: &RoomId,
        email: &str,
        user_type: Option<UserType>,
        updated_by: &str,
    ) -> Option<usize> {
        let event = RoomEvent::AccessChanged(AccessChangedEvent {
            email: email.to_string(),
            user_type,
            updated_by: updated_by.to_string(),
            timestamp: Utc::now(),
        });
        self.publish(room_id, event).await
    }

    /// Drop a room's channel, ending every subscriber's stream.
    pub async fn close(&self, room_id: &RoomId) -> bool {
        self.channels.write().await.remove(room_id).is_some()
    }

    /// Get the number of active channels.
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Get the number of subscribers for a room.
    pub async fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.channels
            .read()
            .await
            .get(room_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Clean up channels with no subscribers.
    pub async fn cleanup_empty_channels(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        before - channels.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
