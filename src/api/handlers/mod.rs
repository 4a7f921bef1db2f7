//! REST endpoint handlers organized by resource.

pub mod legacy;
pub mod lobby;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes the lobby and legacy routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(lobby::routes())
        .merge(legacy::routes())
}
