//! Server-Sent Events (SSE) endpoint for document revalidation.
//!
//! Clients viewing a document subscribe here instead of polling the room.
//!
//! Endpoint: GET /documents/{id}/events
//!
//! # Event Types
//!
//! - `revalidate`: The document page was invalidated and should be re-fetched
//! - `access_changed`: A collaborator was added, changed, or removed
//! - `heartbeat`: Sent every 30 seconds to keep the connection alive
//! - `catchup`: Sent when the client falls behind and should re-fetch
//!
//! # Example
//!
//! ```text
//! event: revalidate
//! data: {"type":"revalidate","path":"/document/abc","timestamp":"..."}
//!
//! event: heartbeat
//! data: {"type":"heartbeat"}
//! ```

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use chrono::Utc;
use futures::stream::{self, Stream};
use livedoc_core::RoomId;
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::error::ApiResult;
use crate::events::{CatchupEvent, HEARTBEAT_INTERVAL_SECS, HeartbeatEvent, RoomEvent};
use crate::extract::CurrentUser;
use crate::routes::documents::{load_room, parse_room_id, require_access};
use crate::state::AppState;

/// Render a room event as an SSE frame.
fn to_sse(event: &RoomEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(data) => Some(Event::default().event(event.name()).data(data)),
        Err(e) => {
            tracing::error!(error = %e, event = event.name(), "Failed to serialize event");
            None
        }
    }
}

/// Per-connection stream state.
struct Subscription {
    rx: Receiver<RoomEvent>,
    room_id: RoomId,
    email: String,
    /// Set once the subscriber's own removal has been delivered.
    removed: bool,
}

impl Subscription {
    fn is_removed_by(&self, event: &RoomEvent) -> bool {
        matches!(
            event,
            RoomEvent::AccessChanged(change)
                if change.user_type.is_none() && change.email == self.email
        )
    }
}

/// GET /documents/{id}/events - Subscribe to a document's events.
///
/// Only users in the room's access map may subscribe. The stream ends when
/// the document is deleted, or right after the `access_changed` event that
/// removes the subscriber from the room.
///
/// # Response
///
/// - 200 OK: SSE stream (Content-Type: text/event-stream)
/// - 403 Forbidden: caller has no access to the document
/// - 404 Not Found: no such room
///
/// # Backpressure
///
/// If a client falls behind (channel buffer overflows), a `catchup` event is
/// sent with the number of events missed. The client should re-fetch the
/// document.
async fn subscribe_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(raw_id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let room_id = parse_room_id(&raw_id)?;
    let room = load_room(&state, &room_id).await?;
    require_access(&room, &user)?;

    let receiver = state.broadcaster().subscribe(&room_id).await;

    tracing::info!(room_id = %room_id, email = %user.email, "Client subscribed to SSE events");

    let subscription = Subscription {
        rx: receiver,
        room_id,
        email: user.email,
        removed: false,
    };

    let stream = stream::unfold(subscription, |mut sub| async move {
        if sub.removed {
            tracing::debug!(room_id = %sub.room_id, email = %sub.email, "Subscriber removed, ending SSE stream");
            return None;
        }

        loop {
            let event = match sub.rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(count)) => {
                    tracing::warn!(
                        room_id = %sub.room_id,
                        events_missed = count,
                        "SSE client lagged, sending catchup event"
                    );
                    RoomEvent::Catchup(CatchupEvent {
                        events_missed: count,
                        timestamp: Utc::now(),
                    })
                }
                Err(RecvError::Closed) => {
                    tracing::debug!(room_id = %sub.room_id, "Event channel closed, ending SSE stream");
                    return None;
                }
            };

            sub.removed = sub.is_removed_by(&event);

            match to_sse(&event) {
                Some(sse_event) => return Some((Ok(sse_event), sub)),
                None if sub.removed => return None,
                None => {}
            }
        }
    });

    let heartbeat = RoomEvent::Heartbeat(HeartbeatEvent::default());
    let mut keep_alive = KeepAlive::new().interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
    if let Some(event) = to_sse(&heartbeat) {
        keep_alive = keep_alive.event(event);
    }

    Ok(Sse::new(stream).keep_alive(keep_alive))
}

/// Build SSE event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/documents/{id}/events", get(subscribe_events))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use futures::StreamExt;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::events::RevalidateEvent;
    use crate::extract::DEV_EMAIL_HEADER;
    use crate::routes::test_support::{GUEST, OWNER, STRANGER, create_as, send, test_app};

    #[test]
    fn test_heartbeat_interval() {
        assert_eq!(HEARTBEAT_INTERVAL_SECS, 30);
    }

    #[test]
    fn test_to_sse_renders_event() {
        let event = RoomEvent::Revalidate(RevalidateEvent {
            path: "/document/abc".to_string(),
            timestamp: Utc::now(),
        });
        assert!(to_sse(&event).is_some());
    }

    #[tokio::test]
    async fn test_subscribe_requires_access() {
        let (app, _, state) = test_app();
        let id = create_as(&app, OWNER).await;

        let (status, _) = send(
            &app,
            "GET",
            &format!("/documents/{id}/events"),
            Some(STRANGER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let room_id: RoomId = id.parse().unwrap();
        assert_eq!(state.broadcaster().subscriber_count(&room_id).await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_room() {
        let (app, _, _) = test_app();
        let (status, _) = send(&app, "GET", "/documents/missing/events", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stream_ends_after_subscriber_is_removed() {
        let (app, _, state) = test_app();
        let id = create_as(&app, OWNER).await;
        let (status, _) = send(
            &app,
            "POST",
            &format!("/documents/{id}/share"),
            Some(OWNER),
            Some(json!({ "email": GUEST, "userType": "viewer" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri(format!("/documents/{id}/events"))
            .header(DEV_EMAIL_HEADER, GUEST)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let room_id: RoomId = id.parse().unwrap();
        assert_eq!(state.broadcaster().subscriber_count(&room_id).await, 1);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/documents/{id}/share/{GUEST}"),
            Some(OWNER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let mut body = response.into_body().into_data_stream();
        let mut frames = String::new();
        let ended = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(chunk) = body.next().await {
                frames.push_str(&String::from_utf8_lossy(&chunk.unwrap()));
            }
        })
        .await;

        assert!(ended.is_ok(), "stream stayed open after removal: {frames}");
        assert!(frames.contains("event: access_changed"));
        assert!(frames.contains(GUEST));
        assert_eq!(state.broadcaster().subscriber_count(&room_id).await, 0);
    }

    #[test]
    fn test_removal_of_other_user_keeps_stream() {
        let (tx, rx) = tokio::sync::broadcast::channel(4);
        drop(tx);
        let sub = Subscription {
            rx,
            room_id: "room".parse().unwrap(),
            email: GUEST.to_string(),
            removed: false,
        };
        let change = |email: &str, user_type| {
            RoomEvent::AccessChanged(crate::events::AccessChangedEvent {
                email: email.to_string(),
                user_type,
                updated_by: OWNER.to_string(),
                timestamp: Utc::now(),
            })
        };

        assert!(sub.is_removed_by(&change(GUEST, None)));
        assert!(!sub.is_removed_by(&change(STRANGER, None)));
        assert!(!sub.is_removed_by(&change(GUEST, Some(livedoc_core::UserType::Editor))));
    }
}
