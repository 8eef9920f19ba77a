//! livedoc-rooms: Room management backends for LiveDoc
//!
//! This crate provides:
//! - The [`RoomBackend`] trait: create, fetch, update, list, and delete rooms,
//!   and trigger inbox notifications
//! - [`LiveblocksClient`]: the backend that talks to the Liveblocks REST API
//! - [`MemoryBackend`]: an in-process backend for local development and tests
//!
//! # Usage
//!
//! ```rust,ignore
//! use livedoc_rooms::{RoomsConfig, connect};
//!
//! let config = RoomsConfig::from_env()?;
//! let backend = connect(&config)?;
//!
//! let room = backend.get_room(&room_id).await?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod liveblocks;
pub mod memory;

pub use backend::{connect, RoomBackend, RoomQuery};
pub use config::{BackendKind, RoomsConfig};
pub use error::{RoomsError, RoomsResult};
pub use liveblocks::LiveblocksClient;
pub use memory::MemoryBackend;

// Re-export livedoc-core for downstream crates
pub use livedoc_core;
