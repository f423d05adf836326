use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Every item mutation. The router sits behind the authentication layer, and each handler
/// confirms the `Admin` role through `access::require` before touching the repository.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /api/items
        // Creates an item; responds 201 with the stored record.
        .route("/api/items", post(handlers::create_item))
        // PUT/PATCH/DELETE /api/items/{id}
        // Full overwrite, partial update and removal of a single item.
        .route(
            "/api/items/{id}",
            put(handlers::replace_item)
                .patch(handlers::patch_item)
                .delete(handlers::delete_item),
        )
        // GET /api/admin
        // Greeting reachable only by administrators.
        .route("/api/admin", get(handlers::admin_welcome))
}
