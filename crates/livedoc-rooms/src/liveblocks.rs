//! Liveblocks REST API client.
//!
//! Endpoints used (API v2, bearer secret key):
//! - POST   /v2/rooms                          - create a room
//! - GET    /v2/rooms/{room_id}                - fetch a room
//! - POST   /v2/rooms/{room_id}                - update metadata / accesses
//! - DELETE /v2/rooms/{room_id}                - delete a room
//! - GET    /v2/rooms?userId=..                - list rooms for a user
//! - POST   /v2/inbox-notifications/trigger    - notify a user

use std::time::Duration;

use async_trait::async_trait;
use livedoc_core::{InboxNotification, NewRoom, Room, RoomId, RoomPage, RoomUpdate};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::backend::{RoomBackend, RoomQuery};
use crate::config::RoomsConfig;
use crate::error::{RoomsError, RoomsResult};

/// Error body returned by the service.
#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the Liveblocks REST API.
#[derive(Debug, Clone)]
pub struct LiveblocksClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl LiveblocksClient {
    /// Build a client from configuration.
    pub fn new(config: &RoomsConfig) -> RoomsResult<Self> {
        if config.secret_key.is_empty() {
            return Err(RoomsError::Config(
                "Liveblocks secret key is empty".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn room_url(&self, room_id: &RoomId) -> String {
        self.url(&format!("/v2/rooms/{}", room_id))
    }

    async fn send(&self, request: RequestBuilder) -> RoomsResult<Response> {
        Ok(request.bearer_auth(&self.secret_key).send().await?)
    }

    /// Turn a non-success response into an error.
    async fn check(response: Response, room_id: Option<&RoomId>) -> RoomsResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = room_id {
                return Err(RoomsError::RoomNotFound(id.clone()));
            }
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ServiceError>(&body) {
            Ok(ServiceError {
                message: Some(message),
                ..
            }) => message,
            Ok(ServiceError {
                error: Some(error), ..
            }) => error,
            _ if body.is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
            _ => body,
        };

        Err(RoomsError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        room_id: Option<&RoomId>,
    ) -> RoomsResult<T> {
        let response = Self::check(response, room_id).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RoomBackend for LiveblocksClient {
    async fn create_room(&self, room: &NewRoom) -> RoomsResult<Room> {
        let response = self
            .send(self.http.post(self.url("/v2/rooms")).json(room))
            .await?;
        let created: Room = Self::read_json(response, None).await?;

        tracing::debug!(room_id = %created.id, "Liveblocks room created");
        Ok(created)
    }

    async fn get_room(&self, room_id: &RoomId) -> RoomsResult<Room> {
        let response = self.send(self.http.get(self.room_url(room_id))).await?;
        Self::read_json(response, Some(room_id)).await
    }

    async fn update_room(&self, room_id: &RoomId, update: &RoomUpdate) -> RoomsResult<Room> {
        let response = self
            .send(self.http.post(self.room_url(room_id)).json(update))
            .await?;
        Self::read_json(response, Some(room_id)).await
    }

    async fn delete_room(&self, room_id: &RoomId) -> RoomsResult<()> {
        let response = self.send(self.http.delete(self.room_url(room_id))).await?;
        Self::check(response, Some(room_id)).await?;
        Ok(())
    }

    async fn get_rooms(&self, query: &RoomQuery) -> RoomsResult<RoomPage> {
        let params = RoomQuery {
            limit: Some(query.effective_limit()),
            ..query.clone()
        };
        let response = self
            .send(self.http.get(self.url("/v2/rooms")).query(&params))
            .await?;
        Self::read_json(response, None).await
    }

    async fn trigger_inbox_notification(
        &self,
        notification: &InboxNotification,
    ) -> RoomsResult<()> {
        let response = self
            .send(
                self.http
                    .post(self.url("/v2/inbox-notifications/trigger"))
                    .json(notification),
            )
            .await?;
        Self::check(response, None).await?;

        tracing::debug!(
            recipient = %notification.user_id,
            kind = %notification.kind,
            "Inbox notification triggered"
        );
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use livedoc_core::{AccessPatch, DocumentAccessActivity, UserIdentity, UserType};
    use serde_json::json;
    use wiremock::matchers::{
        body_json, header, method, path, query_param, query_param_is_missing,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn room_json(id: &str) -> serde_json::Value {
        json!({
            "type": "room",
            "id": id,
            "createdAt": "2024-04-01T10:00:00.000Z",
            "lastConnectionAt": null,
            "metadata": { "creatorId": "user_1", "email": "o@example.com", "title": "Untitled" },
            "defaultAccesses": [],
            "groupsAccesses": {},
            "usersAccesses": { "o@example.com": ["room:write"] }
        })
    }

    fn client_for(server: &MockServer) -> LiveblocksClient {
        LiveblocksClient::new(&RoomsConfig::liveblocks(server.uri(), "sk_test")).unwrap()
    }

    #[test]
    fn test_new_requires_secret_key() {
        let config = RoomsConfig::liveblocks("http://localhost:1", "");
        assert!(matches!(
            LiveblocksClient::new(&config),
            Err(RoomsError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_create_room_posts_body_with_auth() {
        let server = MockServer::start().await;
        let new_room = NewRoom::for_creator("abc".parse().unwrap(), "user_1", "o@example.com");

        Mock::given(method("POST"))
            .and(path("/v2/rooms"))
            .and(header("authorization", "Bearer sk_test"))
            .and(body_json(serde_json::to_value(&new_room).unwrap()))
            .respond_with(ResponseTemplate::new(200).set_body_json(room_json("abc")))
            .expect(1)
            .mount(&server)
            .await;

        let room = client_for(&server).create_room(&new_room).await.unwrap();
        assert_eq!(room.id.as_str(), "abc");
        assert!(room.can_write("o@example.com"));
    }

    #[tokio::test]
    async fn test_get_room_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/rooms/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "ROOM_NOT_FOUND",
                "message": "Room not found"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_room(&"missing".parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RoomsError::RoomNotFound(id) if id.as_str() == "missing"));
    }

    #[tokio::test]
    async fn test_update_room_sends_null_for_removed_user() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/rooms/abc"))
            .and(body_json(json!({ "usersAccesses": { "b@example.com": null } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(room_json("abc")))
            .expect(1)
            .mount(&server)
            .await;

        let update = RoomUpdate::accesses(AccessPatch::new().revoke("b@example.com"));
        let room = client_for(&server)
            .update_room(&"abc".parse().unwrap(), &update)
            .await
            .unwrap();
        assert!(!room.has_access("b@example.com"));
    }

    #[tokio::test]
    async fn test_update_title_sends_metadata_only() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/rooms/abc"))
            .and(body_json(json!({ "metadata": { "title": "Roadmap" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(room_json("abc")))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .update_room(&"abc".parse().unwrap(), &RoomUpdate::title("Roadmap"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_rooms_passes_user_filter() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/rooms"))
            .and(query_param("userId", "o@example.com"))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "nextCursor": null,
                "data": [room_json("a"), room_json("b")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server)
            .get_rooms(&RoomQuery::for_user("o@example.com"))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 2);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_get_rooms_follows_next_cursor() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/rooms"))
            .and(query_param("userId", "o@example.com"))
            .and(query_param_is_missing("startingAfter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "nextCursor": "cur_1",
                "nextPage": "/v2/rooms?userId=o%40example.com&startingAfter=cur_1",
                "data": [room_json("a")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/rooms"))
            .and(query_param("userId", "o@example.com"))
            .and(query_param("startingAfter", "cur_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "nextCursor": null,
                "nextPage": null,
                "data": [room_json("b")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut query = RoomQuery::for_user("o@example.com");

        let first = client.get_rooms(&query).await.unwrap();
        assert_eq!(first.next_cursor.as_deref(), Some("cur_1"));

        query.starting_after = first.next_cursor;
        let second = client.get_rooms(&query).await.unwrap();
        assert_eq!(second.data[0].id.as_str(), "b");
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_delete_room_accepts_no_content() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v2/rooms/abc"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .delete_room(&"abc".parse().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v2/rooms/abc"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "INTERNAL",
                "message": "something broke"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete_room(&"abc".parse().unwrap())
            .await
            .unwrap_err();
        match err {
            RoomsError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "something broke");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_trigger_inbox_notification() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/inbox-notifications/trigger"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let updater = UserIdentity {
            id: "user_1".to_string(),
            email: "o@example.com".to_string(),
            name: "Owner".to_string(),
            avatar: None,
        };
        let notification = InboxNotification::document_access(
            "b@example.com",
            "abc".parse().unwrap(),
            DocumentAccessActivity::new(UserType::Viewer, &updater),
        );

        client_for(&server)
            .trigger_inbox_notification(&notification)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["kind"], "$documentAccess");
        assert_eq!(body["activityData"]["title"], "Document viewer access updated by Owner");
    }
}
