use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Endpoints for any caller holding a valid token, whatever their role.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/items
        // Full listing of the collection in insertion order.
        .route("/api/items", get(handlers::list_items))
        // GET /api/user
        // Greeting for signed-in users (User or Admin).
        .route("/api/user", get(handlers::user_welcome))
}
