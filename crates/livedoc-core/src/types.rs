//! Room, access, and notification types.
//!
//! These mirror the records exchanged with the collaboration service:
//!
//! - A [`Room`] carries owner metadata and a per-user access map keyed by email
//! - An [`AccessLevel`] is one capability string (`room:write`, `room:read`, ...)
//! - A [`UserType`] is the tier a collaborator is invited with, expanded into
//!   access levels by [`UserType::access_levels`]
//! - An [`AccessPatch`] updates the access map; a `null` entry removes a user
//! - An [`InboxNotification`] tells a user their access changed

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title given to every newly created document.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Inbox notification kind for access changes.
pub const DOCUMENT_ACCESS_KIND: &str = "$documentAccess";

/// Length of generated room and notification ids.
pub const GENERATED_ID_LEN: usize = 21;

/// Longest room id accepted from callers.
pub const MAX_ROOM_ID_LEN: usize = 128;

const ID_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Generate a random URL-safe identifier.
fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

// ============================================================================
// ID Types
// ============================================================================

/// Identifier of a room in the collaboration service.
///
/// Generated once when a document is created and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Generate a new random room id.
    #[must_use]
    pub fn generate() -> Self {
        Self(generate_id())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Error returned when a string is not a usable room id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRoomId(pub String);

impl fmt::Display for InvalidRoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid room id: {}", self.0)
    }
}

impl std::error::Error for InvalidRoomId {}

impl FromStr for RoomId {
    type Err = InvalidRoomId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s.len() <= MAX_ROOM_ID_LEN
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidRoomId(s.to_string()))
        }
    }
}

/// Subject id attached to an inbox notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Generate a new random subject id.
    #[must_use]
    pub fn generate() -> Self {
        Self(generate_id())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Access Control
// ============================================================================

/// A capability granted to a user in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    #[serde(rename = "room:write")]
    RoomWrite,
    #[serde(rename = "room:read")]
    RoomRead,
    #[serde(rename = "room:presence:write")]
    RoomPresenceWrite,
    #[serde(rename = "comments:write")]
    CommentsWrite,
    #[serde(rename = "comments:read")]
    CommentsRead,
}

impl AccessLevel {
    /// Wire representation of this access level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RoomWrite => "room:write",
            Self::RoomRead => "room:read",
            Self::RoomPresenceWrite => "room:presence:write",
            Self::CommentsWrite => "comments:write",
            Self::CommentsRead => "comments:read",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tier a collaborator is invited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Creator,
    Editor,
    Viewer,
}

impl UserType {
    /// Access levels granted for this tier.
    ///
    /// Creators and editors can write; viewers can read and broadcast presence.
    #[must_use]
    pub fn access_levels(&self) -> Vec<AccessLevel> {
        match self {
            Self::Creator | Self::Editor => vec![AccessLevel::RoomWrite],
            Self::Viewer => vec![AccessLevel::RoomRead, AccessLevel::RoomPresenceWrite],
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(Self::Creator),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            other => Err(format!("unknown user type: {}", other)),
        }
    }
}

/// Mapping from user email to the access levels granted in a room.
pub type RoomAccesses = BTreeMap<String, Vec<AccessLevel>>;

/// Partial update of a room's access map.
///
/// `Some(levels)` sets the user's access, `None` (serialized as `null`)
/// removes the user from the room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessPatch(BTreeMap<String, Option<Vec<AccessLevel>>>);

impl AccessPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `email`'s access to `levels`.
    #[must_use]
    pub fn grant(mut self, email: impl Into<String>, levels: Vec<AccessLevel>) -> Self {
        self.0.insert(email.into(), Some(levels));
        self
    }

    /// Remove `email` from the room.
    #[must_use]
    pub fn revoke(mut self, email: impl Into<String>) -> Self {
        self.0.insert(email.into(), None);
        self
    }

    /// Whether this patch changes `email`'s entry.
    #[must_use]
    pub fn touches(&self, email: &str) -> bool {
        self.0.contains_key(email)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply the patch to an access map.
    pub fn apply_to(&self, accesses: &mut RoomAccesses) {
        for (email, levels) in &self.0 {
            match levels {
                Some(levels) => {
                    accesses.insert(email.clone(), levels.clone());
                }
                None => {
                    accesses.remove(email);
                }
            }
        }
    }
}

// ============================================================================
// Rooms
// ============================================================================

/// Owner metadata stored on a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMetadata {
    /// Identity-provider id of the user who created the room.
    pub creator_id: String,
    /// Email of the owner. The owner can never be removed.
    pub email: String,
    /// Document title.
    pub title: String,
    /// Any other metadata keys present on the room.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RoomMetadata {
    /// Metadata for a room created by `creator_id` / `email`.
    #[must_use]
    pub fn new(creator_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            creator_id: creator_id.into(),
            email: email.into(),
            title: DEFAULT_TITLE.to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Merge a metadata patch. `null` values remove extra keys.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            let text = value.as_str().map(str::to_string);
            match (key.as_str(), text) {
                ("title", Some(v)) => self.title = v,
                ("email", Some(v)) => self.email = v,
                ("creatorId", Some(v)) => self.creator_id = v,
                ("title" | "email" | "creatorId", None) => {}
                (_, _) if value.is_null() => {
                    self.extra.remove(key);
                }
                (_, _) => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

fn room_type() -> String {
    "room".to_string()
}

/// A room as returned by the collaboration service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(rename = "type", default = "room_type")]
    pub kind: String,
    pub id: RoomId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_connection_at: Option<DateTime<Utc>>,
    pub metadata: RoomMetadata,
    #[serde(default)]
    pub default_accesses: Vec<AccessLevel>,
    #[serde(default)]
    pub users_accesses: RoomAccesses,
    #[serde(default)]
    pub groups_accesses: RoomAccesses,
}

impl Room {
    /// Build the room record the service would return for `new_room`.
    #[must_use]
    pub fn from_new(new_room: NewRoom, created_at: DateTime<Utc>) -> Self {
        Self {
            kind: room_type(),
            id: new_room.id,
            created_at: Some(created_at),
            last_connection_at: None,
            metadata: new_room.metadata,
            default_accesses: new_room.default_accesses,
            users_accesses: new_room.users_accesses,
            groups_accesses: RoomAccesses::new(),
        }
    }

    /// Email of the room owner.
    #[must_use]
    pub fn owner_email(&self) -> &str {
        &self.metadata.email
    }

    #[must_use]
    pub fn is_owner(&self, email: &str) -> bool {
        self.metadata.email == email
    }

    /// Whether `email` appears in the room's access map.
    #[must_use]
    pub fn has_access(&self, email: &str) -> bool {
        self.users_accesses.contains_key(email)
    }

    /// Whether `email` holds `room:write`.
    #[must_use]
    pub fn can_write(&self, email: &str) -> bool {
        self.users_accesses
            .get(email)
            .is_some_and(|levels| levels.contains(&AccessLevel::RoomWrite))
    }

    /// Apply an update in place, the way the service merges it.
    pub fn apply_update(&mut self, update: &RoomUpdate) {
        if let Some(metadata) = &update.metadata {
            self.metadata.merge(metadata);
        }
        if let Some(patch) = &update.users_accesses {
            patch.apply_to(&mut self.users_accesses);
        }
        if let Some(defaults) = &update.default_accesses {
            self.default_accesses = defaults.clone();
        }
    }
}

/// Body of a room creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    pub id: RoomId,
    pub default_accesses: Vec<AccessLevel>,
    pub users_accesses: RoomAccesses,
    pub metadata: RoomMetadata,
}

impl NewRoom {
    /// A private, untitled room granting only its creator write access.
    #[must_use]
    pub fn for_creator(id: RoomId, creator_id: &str, email: &str) -> Self {
        let mut users_accesses = RoomAccesses::new();
        users_accesses.insert(email.to_string(), UserType::Creator.access_levels());

        Self {
            id,
            default_accesses: Vec::new(),
            users_accesses,
            metadata: RoomMetadata::new(creator_id, email),
        }
    }
}

/// Body of a room update request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users_accesses: Option<AccessPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_accesses: Option<Vec<AccessLevel>>,
}

impl RoomUpdate {
    /// Update that sets the document title.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        let mut metadata = Map::new();
        metadata.insert("title".to_string(), Value::String(title.into()));
        Self {
            metadata: Some(metadata),
            ..Self::default()
        }
    }

    /// Update that patches the access map.
    #[must_use]
    pub fn accesses(patch: AccessPatch) -> Self {
        Self {
            users_accesses: Some(patch),
            ..Self::default()
        }
    }
}

/// One page of a room listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPage {
    /// Cursor for the next page. The service's `nextPage` URL is ignored.
    #[serde(default)]
    pub next_cursor: Option<String>,
    pub data: Vec<Room>,
}

// ============================================================================
// Notifications
// ============================================================================

/// Payload of a `$documentAccess` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAccessActivity {
    pub user_type: UserType,
    pub title: String,
    /// Display name of the user who made the change.
    pub updated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Email of the user who made the change.
    pub email: String,
}

impl DocumentAccessActivity {
    #[must_use]
    pub fn new(user_type: UserType, updated_by: &crate::UserIdentity) -> Self {
        let name = updated_by.display_name();
        Self {
            user_type,
            title: format!("Document {} access updated by {}", user_type, name),
            updated_by: name.to_string(),
            avatar: updated_by.avatar.clone(),
            email: updated_by.email.clone(),
        }
    }
}

/// Request to deliver a notification to a user's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxNotification {
    /// Recipient (email).
    pub user_id: String,
    pub kind: String,
    pub subject_id: SubjectId,
    pub activity_data: DocumentAccessActivity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
}

impl InboxNotification {
    /// Notification telling `recipient` their access to `room_id` changed.
    #[must_use]
    pub fn document_access(
        recipient: impl Into<String>,
        room_id: RoomId,
        activity: DocumentAccessActivity,
    ) -> Self {
        Self {
            user_id: recipient.into(),
            kind: DOCUMENT_ACCESS_KIND.to_string(),
            subject_id: SubjectId::generate(),
            activity_data: activity,
            room_id: Some(room_id),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
