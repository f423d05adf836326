use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token: liveness, login, and single-item reads.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/login
        // Exchanges credentials for a bearer token valid for one hour.
        .route("/api/login", post(handlers::login))
        // GET /api/items/{id}
        // Single-item reads are public; listing the collection is not.
        .route("/api/items/{id}", get(handlers::get_item))
}
