//! API routes module

pub mod categories;
pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Create all API routes; `create_router` mounts them under `/api`.
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/products", products::router(state, "/api/products"))
        .nest("/v2/products", products::router(state, "/api/v2/products"))
        .nest("/categories", categories::router(state))
}
