//! Productos Domain
//!
//! Products with an embedded category and an optional photo, stored in
//! MongoDB, plus the categories themselves.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, response envelopes
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌────────────┐
//! │   Service   │ ──► │ PhotoStore │  ← uploaded photos
//! └──────┬──────┘     └────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (traits + MongoDB implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, request bodies, validation rules
//! └─────────────┘
//! ```
//!
//! # Paths
//!
//! Routers carry paths relative to their mount point. `products-api` serves
//! them under the `/api` prefix: `/api/products`, `/api/v2/products` and
//! `/api/categories`, which are also the `Location` header bases.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     handlers,
//!     mongodb::{MongoCategoriaRepository, MongoProductoRepository},
//!     service::ProductoService,
//!     storage::LocalPhotoStore,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("mydb");
//!
//! let service = ProductoService::new(
//!     MongoProductoRepository::new(&db),
//!     MongoCategoriaRepository::new(&db),
//!     LocalPhotoStore::new("uploads").await?,
//! );
//!
//! let router = handlers::router(service, "/api/products", 10 * 1024 * 1024);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod storage;
pub mod validation;

pub use error::{ProductoError, ProductoResult};
pub use handlers::{ApiDoc, CategoriasApiDoc, ErroresProducto, ProductoCreado};
pub use models::{Categoria, EditProducto, NewCategoria, NewProducto, Producto};
pub use crate::mongodb::{MongoCategoriaRepository, MongoProductoRepository};
pub use repository::{CategoriaRepository, ProductoRepository};
pub use service::ProductoService;
pub use storage::{LocalPhotoStore, PhotoStore};
pub use validation::FieldError;
