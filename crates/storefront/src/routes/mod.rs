//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (database reachable)
//!
//! # Catalog
//! GET    /api/products              - Active products, newest first
//! GET    /api/products/{slug}       - Product detail
//! GET    /api/search?q=             - Search by name / short description
//!
//! # Cart (session)
//! GET    /api/cart                  - Cart and totals
//! DELETE /api/cart                  - Clear
//! GET    /api/cart/count            - Total quantity
//! POST   /api/cart/merge            - Fold in a client-held cart snapshot
//! POST   /api/cart/items            - Add `{product_id, quantity?}`
//! PUT    /api/cart/items/{id}       - Set quantity `{quantity}`
//! DELETE /api/cart/items/{id}       - Remove line
//! POST   /api/checkout              - Validate against current stock
//! ```

pub mod cart;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list))
        .route("/products/{slug}", get(products::show))
        .route("/search", get(products::search))
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/count", get(cart::count))
        .route("/cart/merge", post(cart::merge))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/checkout", post(cart::checkout))
}

/// Create the complete router for storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
