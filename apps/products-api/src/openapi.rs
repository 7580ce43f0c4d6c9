//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Productos API",
        version = "0.1.0",
        description = "Product and category management with photo uploads",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/products", api = domain_products::ApiDoc),
        (path = "/api/categories", api = domain_products::CategoriasApiDoc)
    ),
    tags(
        (name = "Productos", description = "Product management endpoints"),
        (name = "Categorias", description = "Category management endpoints")
    )
)]
pub struct ApiDoc;
