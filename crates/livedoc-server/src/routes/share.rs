//! Collaborator access routes.
//!
//! This module implements the sharing-related HTTP endpoints:
//! - POST /documents/{id}/share - Grant or change a collaborator's access
//! - DELETE /documents/{id}/share/{email} - Remove a collaborator
//!
//! The owner (the email stored in the room's metadata) can neither be
//! removed nor have their access rewritten.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};
use livedoc_core::{
    AccessPatch, DocumentAccessActivity, InboxNotification, Room, RoomUpdate, UserType,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::routes::documents::{load_room, parse_room_id, require_write};
use crate::state::AppState;

/// Request body for POST /documents/{id}/share.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    /// Collaborator email.
    pub email: String,
    /// Tier to grant.
    #[serde(alias = "user_type")]
    pub user_type: UserType,
}

/// POST /documents/{id}/share - Grant or change a collaborator's access.
///
/// On success the collaborator gets a `$documentAccess` inbox notification
/// naming the caller as the one who changed their access. A failed
/// notification is logged and does not fail the request.
///
/// # Request
///
/// Body: `{ "email": "b@example.com", "userType": "editor" }`
///
/// # Response
///
/// - 200 OK: the updated room
/// - 400 Bad Request: empty email, or the email is the owner's
/// - 403 Forbidden: the caller cannot edit the document
/// - 404 Not Found: no such room
async fn update_access(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(raw_id): Path<String>,
    Json(request): Json<ShareRequest>,
) -> ApiResult<Json<Room>> {
    let room_id = parse_room_id(&raw_id)?;

    let email = request.email.trim();
    if email.is_empty() {
        return Err(ApiError::BadRequest("Collaborator email cannot be empty".to_string()));
    }

    let room = load_room(&state, &room_id).await?;
    require_write(&room, &user)?;

    if room.is_owner(email) {
        return Err(ApiError::BadRequest(
            "The document owner's access cannot be changed".to_string(),
        ));
    }

    let patch = AccessPatch::new().grant(email, request.user_type.access_levels());
    let updated = state
        .backend()
        .update_room(&room_id, &RoomUpdate::accesses(patch))
        .await
        .map_err(|e| {
            tracing::error!(room_id = %room_id, email = %email, error = %e, "Error happened while updating room access");
            ApiError::from(e)
        })?;

    let notification = InboxNotification::document_access(
        email,
        room_id.clone(),
        DocumentAccessActivity::new(request.user_type, &user),
    );
    if let Err(e) = state.backend().trigger_inbox_notification(&notification).await {
        tracing::warn!(
            room_id = %room_id,
            email = %email,
            error = %e,
            "Failed to notify collaborator of access change"
        );
    }

    state
        .broadcaster()
        .publish_access_changed(&room_id, email, Some(request.user_type), &user.email)
        .await;
    state.revalidate_document(&room_id).await;
    state.revalidate_root();

    tracing::info!(
        room_id = %room_id,
        target = %email,
        user_type = %request.user_type,
        updated_by = %user.email,
        "Access updated"
    );

    Ok(Json(updated))
}

/// DELETE /documents/{id}/share/{email} - Remove a collaborator.
///
/// Editors can remove anyone but the owner; any collaborator can remove
/// themselves.
///
/// # Response
///
/// - 200 OK: the updated room
/// - 400 Bad Request: the email is the owner's
/// - 403 Forbidden: the caller cannot edit the document
/// - 404 Not Found: no such room
async fn remove_collaborator(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((raw_id, email)): Path<(String, String)>,
) -> ApiResult<Json<Room>> {
    let room_id = parse_room_id(&raw_id)?;
    let room = load_room(&state, &room_id).await?;

    if room.is_owner(&email) {
        return Err(ApiError::BadRequest(
            "You cannot remove the owner of the document".to_string(),
        ));
    }

    if email != user.email {
        require_write(&room, &user)?;
    }

    let patch = AccessPatch::new().revoke(email.as_str());
    let updated = state
        .backend()
        .update_room(&room_id, &RoomUpdate::accesses(patch))
        .await
        .map_err(|e| {
            tracing::error!(room_id = %room_id, email = %email, error = %e, "Error happened while removing a collaborator");
            ApiError::from(e)
        })?;

    state
        .broadcaster()
        .publish_access_changed(&room_id, &email, None, &user.email)
        .await;
    state.revalidate_document(&room_id).await;
    state.revalidate_root();

    tracing::info!(room_id = %room_id, target = %email, removed_by = %user.email, "Collaborator removed");

    Ok(Json(updated))
}

/// Build share routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents/{id}/share", post(update_access))
        .route("/documents/{id}/share/{email}", delete(remove_collaborator))
}

// ============================================================================
// Tests
// ============================================================================
