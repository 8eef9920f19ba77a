//! livedoc-server: HTTP route layer for LiveDoc documents
//!
//! This crate provides:
//! - Document lifecycle endpoints (create, read, rename, list, delete)
//! - Collaborator access endpoints (share, remove) with inbox notifications
//! - Identity extraction from bearer tokens
//! - Page cache invalidation and Server-Sent Events (SSE) for revalidation
//! - The page shell configuration (metadata and appearance)
//!
//! # Architecture
//!
//! Every document is a room in the collaboration service, reached through a
//! [`livedoc_rooms::RoomBackend`]. The server is built on Axum with a
//! middleware stack for:
//! - Request tracing and logging
//! - CORS handling
//! - Request ID generation
//! - JSON error responses
//!
//! # Usage
//!
//! ```rust,ignore
//! use livedoc_server::{AppState, ServerConfig, routes};
//! use livedoc_rooms::{RoomsConfig, connect};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = connect(&RoomsConfig::from_env()?)?;
//!     let app = routes::build_router(AppState::new(backend, ServerConfig::from_env()?));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-exports for convenience
pub use cache::PageCache;
pub use config::{ConfigError, ServerConfig, ShellConfig};
pub use error::{ApiError, ApiResult};
pub use events::{EventBroadcaster, RoomEvent};
pub use extract::CurrentUser;
pub use state::AppState;

// Re-export dependent crates
pub use livedoc_core;
pub use livedoc_rooms;
