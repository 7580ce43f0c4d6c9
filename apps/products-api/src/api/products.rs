//! Products API routes

use axum::Router;
use domain_products::handlers;

use crate::state::AppState;

/// Product routes answering with `Location` headers under `location_base`.
pub fn router(state: &AppState, location_base: &str) -> Router {
    handlers::router(
        state.productos.clone(),
        location_base,
        state.config.uploads.max_file_size,
    )
}
