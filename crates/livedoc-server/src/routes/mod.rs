//! Route definitions for the HTTP API.

pub mod documents;
pub mod events;
pub mod health;
pub mod share;
pub mod shell;

use axum::Router;

use crate::state::AppState;

/// Build the complete router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(shell::routes())
        .merge(documents::routes())
        .merge(share::routes())
        .merge(events::routes())
        .with_state(state)
}
