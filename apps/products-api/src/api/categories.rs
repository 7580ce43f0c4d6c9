//! Categories API routes

use axum::Router;
use domain_products::handlers;

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    handlers::categorias_router(state.productos.clone(), "/api/categories")
}
