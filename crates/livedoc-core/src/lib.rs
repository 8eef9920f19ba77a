//! livedoc-core: Core types for LiveDoc
//!
//! This crate provides:
//! - Room identifiers and the room record returned by the collaboration service
//! - Access levels, user types, and the access-map patch format
//! - Inbox notification payloads sent after access changes
//! - The identity of an authenticated caller
//!
//! All wire types use the collaboration service's camelCase JSON shape so
//! they can be sent and received without an intermediate mapping layer.

pub mod identity;
pub mod types;

pub use identity::UserIdentity;
pub use types::{
    AccessLevel, AccessPatch, DocumentAccessActivity, InboxNotification, InvalidRoomId, NewRoom, Room,
    RoomAccesses, RoomId, RoomMetadata, RoomPage, RoomUpdate, SubjectId, UserType,
    DEFAULT_TITLE, DOCUMENT_ACCESS_KIND,
};
