//! Document (room) lifecycle routes.
//!
//! This module implements the document-related HTTP endpoints:
//! - GET /documents - List documents the caller participates in
//! - POST /documents - Create a new document
//! - GET /documents/{id} - Fetch a document the caller has access to
//! - PATCH /documents/{id} - Rename a document
//! - DELETE /documents/{id} - Delete a document, then redirect to `/`

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::get,
};
use livedoc_core::{NewRoom, Room, RoomId, RoomPage, RoomUpdate, UserIdentity};
use livedoc_rooms::RoomQuery;
use serde::Deserialize;

use crate::cache::{ROOT_PATH, document_path};
use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for GET /documents.
#[derive(Debug, Default, Deserialize)]
pub struct ListDocumentsQuery {
    /// Page size.
    pub limit: Option<u32>,
    /// Cursor from the previous page's `nextCursor`.
    pub cursor: Option<String>,
}

/// Request body for PATCH /documents/{id}.
#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    /// New document title.
    pub title: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a room id from a path segment.
pub(crate) fn parse_room_id(raw: &str) -> ApiResult<RoomId> {
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("{}", e)))
}

/// Fetch a room, serving it from the page cache when fresh.
pub(crate) async fn load_room(state: &AppState, room_id: &RoomId) -> ApiResult<Room> {
    let path = document_path(room_id);
    if let Some(room) = state.rooms().get(&path, None) {
        return Ok(room);
    }
    let generation = state.rooms().generation(&path);

    let room = state.backend().get_room(room_id).await.map_err(|e| {
        tracing::error!(room_id = %room_id, error = %e, "Error happened while fetching a room");
        ApiError::from(e)
    })?;
    state
        .rooms()
        .set_if_current(&path, None, generation, room.clone());
    Ok(room)
}

/// Fail unless `user` appears in the room's access map.
pub(crate) fn require_access(room: &Room, user: &UserIdentity) -> ApiResult<()> {
    if room.has_access(&user.email) {
        Ok(())
    } else {
        tracing::warn!(room_id = %room.id, email = %user.email, "Access denied to room");
        Err(ApiError::Forbidden(
            "You don't have access to this document".to_string(),
        ))
    }
}

/// Fail unless `user` holds write access to the room.
pub(crate) fn require_write(room: &Room, user: &UserIdentity) -> ApiResult<()> {
    if room.can_write(&user.email) {
        Ok(())
    } else {
        tracing::warn!(room_id = %room.id, email = %user.email, "Write access denied to room");
        Err(ApiError::Forbidden(
            "You need edit access to change this document".to_string(),
        ))
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /documents - Create a new document.
///
/// The room gets a fresh random id, the title "Untitled", no default access,
/// and grants the caller write access.
///
/// # Response
///
/// - 201 Created: the room
/// - 502 Bad Gateway: the collaboration service failed
async fn create_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<(StatusCode, Json<Room>)> {
    let room_id = RoomId::generate();
    let new_room = NewRoom::for_creator(room_id.clone(), &user.id, &user.email);

    let room = state.backend().create_room(&new_room).await.map_err(|e| {
        tracing::error!(room_id = %room_id, error = %e, "Error happened while creating a room");
        ApiError::from(e)
    })?;

    state.revalidate_root();

    tracing::info!(room_id = %room.id, email = %user.email, "Document created");

    Ok((StatusCode::CREATED, Json(room)))
}

/// GET /documents/{id} - Fetch a document.
///
/// # Response
///
/// - 200 OK: the room
/// - 403 Forbidden: the caller is not in the room's access map
/// - 404 Not Found: no such room
async fn get_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Room>> {
    let room_id = parse_room_id(&raw_id)?;
    let room = load_room(&state, &room_id).await?;
    require_access(&room, &user)?;

    Ok(Json(room))
}

/// PATCH /documents/{id} - Rename a document.
///
/// # Request
///
/// Body: `{ "title": "Meeting notes" }`
///
/// # Response
///
/// - 200 OK: the updated room
/// - 400 Bad Request: empty title
/// - 403 Forbidden: the caller cannot edit the document
async fn update_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(raw_id): Path<String>,
    Json(request): Json<UpdateTitleRequest>,
) -> ApiResult<Json<Room>> {
    let room_id = parse_room_id(&raw_id)?;

    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest(
            "Document title cannot be empty".to_string(),
        ));
    }

    let room = load_room(&state, &room_id).await?;
    require_write(&room, &user)?;

    let updated = state
        .backend()
        .update_room(&room_id, &RoomUpdate::title(title))
        .await
        .map_err(|e| {
            tracing::error!(room_id = %room_id, error = %e, "Error happened while updating a room");
            ApiError::from(e)
        })?;

    state.revalidate_document(&room_id).await;
    state.revalidate_root();

    tracing::info!(room_id = %room_id, title = %title, "Document renamed");

    Ok(Json(updated))
}

/// GET /documents - List documents the caller participates in.
///
/// The first page (no `limit`/`cursor`) is served from the page cache when
/// fresh.
///
/// # Response
///
/// - 200 OK: `{ "nextCursor": ..., "data": [...] }`
async fn list_documents(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListDocumentsQuery>,
) -> ApiResult<Json<RoomPage>> {
    let cacheable = query.limit.is_none() && query.cursor.is_none();
    if cacheable {
        if let Some(page) = state.listings().get(ROOT_PATH, Some(user.email.as_str())) {
            return Ok(Json(page));
        }
    }

    let generation = state.listings().generation(ROOT_PATH);
    let room_query = RoomQuery {
        user_id: user.email.clone(),
        limit: query.limit,
        starting_after: query.cursor,
    };

    let page = state.backend().get_rooms(&room_query).await.map_err(|e| {
        tracing::error!(email = %user.email, error = %e, "Error happened while fetching rooms");
        ApiError::from(e)
    })?;

    if cacheable {
        state
            .listings()
            .set_if_current(ROOT_PATH, Some(user.email.as_str()), generation, page.clone());
    }

    tracing::debug!(email = %user.email, count = page.data.len(), "Listed documents");

    Ok(Json(page))
}

/// Delete a room the caller can edit.
async fn delete_room_checked(
    state: &AppState,
    user: &UserIdentity,
    raw_id: &str,
) -> ApiResult<RoomId> {
    let room_id = parse_room_id(raw_id)?;
    let room = load_room(state, &room_id).await?;
    require_write(&room, user)?;

    state.backend().delete_room(&room_id).await?;
    Ok(room_id)
}

/// DELETE /documents/{id} - Delete a document.
///
/// Always answers `303 See Other` to `/`, including when the caller could not
/// be identified. Failures are logged and not reported to the caller.
async fn delete_document(
    State(state): State<AppState>,
    identity: Result<CurrentUser, ApiError>,
    Path(raw_id): Path<String>,
) -> Redirect {
    let user = match identity {
        Ok(CurrentUser(user)) => user,
        Err(e) => {
            tracing::error!(room_id = %raw_id, error = %e, "Unidentified caller tried to delete a room");
            return Redirect::to(ROOT_PATH);
        }
    };

    match delete_room_checked(&state, &user, &raw_id).await {
        Ok(room_id) => {
            state.revalidate_document(&room_id).await;
            state.broadcaster().close(&room_id).await;
            tracing::info!(room_id = %room_id, email = %user.email, "Document deleted");
        }
        Err(e) => {
            tracing::error!(
                room_id = %raw_id,
                email = %user.email,
                error = %e,
                "Error happened while deleting a room"
            );
        }
    }

    state.revalidate_root();

    Redirect::to(ROOT_PATH)
}

/// Build document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list_documents).post(create_document))
        .route(
            "/documents/{id}",
            get(get_document)
                .patch(update_document)
                .delete(delete_document),
        )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use livedoc_core::{AccessPatch, DEFAULT_TITLE, UserType};
    use livedoc_rooms::RoomBackend;
    use serde_json::json;

    use crate::routes::test_support::{
        GUEST, OWNER, STRANGER, create_as, failing_app, gated_app, send, test_app,
    };

    #[test]
    fn test_parse_room_id() {
        assert!(parse_room_id("V1StGXR8_Z5jdHi6B-myT").is_ok());
        assert!(matches!(
            parse_room_id("bad id"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_update_title_request_deserialize() {
        let request: UpdateTitleRequest = serde_json::from_str(r#"{"title": "Plan"}"#).unwrap();
        assert_eq!(request.title, "Plan");
    }

    #[tokio::test]
    async fn test_create_document() {
        let (app, backend, _) = test_app();
        let (status, body) = send(&app, "POST", "/documents", Some(OWNER), None).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["metadata"]["title"], DEFAULT_TITLE);
        assert_eq!(body["metadata"]["email"], OWNER);
        assert_eq!(body["metadata"]["creatorId"], OWNER);
        assert_eq!(body["usersAccesses"][OWNER], json!(["room:write"]));
        assert_eq!(body["defaultAccesses"], json!([]));
        assert_eq!(body["id"].as_str().unwrap().len(), 21);
        assert_eq!(backend.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_requires_identity() {
        let (app, _, _) = test_app();
        let (status, body) = send(&app, "POST", "/documents", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_get_document_with_access() {
        let (app, _, _) = test_app();
        let id = create_as(&app, OWNER).await;

        let (status, body) = send(&app, "GET", &format!("/documents/{id}"), Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_get_document_denied_without_access() {
        let (app, _, _) = test_app();
        let id = create_as(&app, OWNER).await;

        let (status, body) =
            send(&app, "GET", &format!("/documents/{id}"), Some(STRANGER), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("You don't have access to this document")
        );
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let (app, _, _) = test_app();
        let (status, body) = send(&app, "GET", "/documents/nope", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_title() {
        let (app, backend, _) = test_app();
        let id = create_as(&app, OWNER).await;

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/documents/{id}"),
            Some(OWNER),
            Some(json!({ "title": "  Roadmap  " })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["title"], "Roadmap");

        let stored = backend.get_room(&id.parse().unwrap()).await.unwrap();
        assert_eq!(stored.metadata.title, "Roadmap");
    }

    #[tokio::test]
    async fn test_update_title_rejects_empty() {
        let (app, _, _) = test_app();
        let id = create_as(&app, OWNER).await;

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/documents/{id}"),
            Some(OWNER),
            Some(json!({ "title": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_title_requires_write() {
        let (app, backend, _) = test_app();
        let id = create_as(&app, OWNER).await;
        backend
            .update_room(
                &id.parse().unwrap(),
                &RoomUpdate::accesses(
                    AccessPatch::new().grant(GUEST, UserType::Viewer.access_levels()),
                ),
            )
            .await
            .unwrap();

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/documents/{id}"),
            Some(GUEST),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_rename_visible_on_next_read() {
        let (app, _, _) = test_app();
        let id = create_as(&app, OWNER).await;
        let uri = format!("/documents/{id}");

        // Prime the page cache.
        send(&app, "GET", &uri, Some(OWNER), None).await;
        send(&app, "PATCH", &uri, Some(OWNER), Some(json!({ "title": "Fresh" }))).await;

        let (_, body) = send(&app, "GET", &uri, Some(OWNER), None).await;
        assert_eq!(body["metadata"]["title"], "Fresh");
    }

    #[tokio::test]
    async fn test_read_racing_removal_does_not_cache_stale_access() {
        let (app, backend) = gated_app();
        let id = create_as(&app, OWNER).await;
        let uri = format!("/documents/{id}");
        send(
            &app,
            "POST",
            &format!("{uri}/share"),
            Some(OWNER),
            Some(json!({ "email": GUEST, "userType": "viewer" })),
        )
        .await;

        // Hold the guest's read after it has fetched the room.
        let (read, release) = backend.hold_next_read().await;
        let guest_read = {
            let app = app.clone();
            let uri = uri.clone();
            tokio::spawn(async move { send(&app, "GET", &uri, Some(GUEST), None).await })
        };
        read.await.unwrap();

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("{uri}/share/{GUEST}"),
            Some(OWNER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        release.send(()).unwrap();
        guest_read.await.unwrap();

        let (status, _) = send(&app, "GET", &uri, Some(GUEST), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_documents_for_user() {
        let (app, _, _) = test_app();
        create_as(&app, OWNER).await;
        create_as(&app, OWNER).await;
        create_as(&app, STRANGER).await;

        let (status, body) = send(&app, "GET", "/documents", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_reflects_new_document() {
        let (app, _, state) = test_app();
        create_as(&app, OWNER).await;

        let (_, first) = send(&app, "GET", "/documents", Some(OWNER), None).await;
        assert_eq!(first["data"].as_array().unwrap().len(), 1);
        assert_eq!(state.listings().len(), 1);

        create_as(&app, OWNER).await;
        assert!(state.listings().is_empty());

        let (_, second) = send(&app, "GET", "/documents", Some(OWNER), None).await;
        assert_eq!(second["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let (app, _, _) = test_app();
        for _ in 0..3 {
            create_as(&app, OWNER).await;
        }

        let (_, first) = send(&app, "GET", "/documents?limit=2", Some(OWNER), None).await;
        assert_eq!(first["data"].as_array().unwrap().len(), 2);
        let cursor = first["nextCursor"].as_str().unwrap().to_string();

        let (_, second) = send(
            &app,
            "GET",
            &format!("/documents?limit=2&cursor={cursor}"),
            Some(OWNER),
            None,
        )
        .await;
        assert_eq!(second["data"].as_array().unwrap().len(), 1);
        assert!(second["nextCursor"].is_null());
    }

    #[tokio::test]
    async fn test_delete_document_redirects() {
        let (app, backend, _) = test_app();
        let id = create_as(&app, OWNER).await;

        let (status, _) = send(&app, "DELETE", &format!("/documents/{id}"), Some(OWNER), None).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(backend.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_redirects_when_service_fails() {
        let app = failing_app();
        let (status, _) = send(&app, "DELETE", "/documents/abc", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_delete_redirects_but_keeps_room_without_write() {
        let (app, backend, _) = test_app();
        let id = create_as(&app, OWNER).await;

        let (status, _) =
            send(&app, "DELETE", &format!("/documents/{id}"), Some(STRANGER), None).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(backend.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_without_identity_still_redirects() {
        let (app, backend, _) = test_app();
        let id = create_as(&app, OWNER).await;

        let (status, _) = send(&app, "DELETE", &format!("/documents/{id}"), None, None).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(backend.room_count().await, 1);

        let (status, _) = send(&app, "GET", &format!("/documents/{id}"), None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_service_failure_is_bad_gateway() {
        let app = failing_app();
        let (status, body) = send(&app, "POST", "/documents", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    }
}
