use async_trait::async_trait;

use crate::error::ProductoResult;
use crate::models::{Categoria, Producto};

/// Persistence of products, addressed by the store-generated string id.
///
/// An id that the backend cannot interpret is treated like an unknown id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductoRepository: Send + Sync {
    async fn find_all(&self) -> ProductoResult<Vec<Producto>>;

    async fn find_by_id(&self, id: &str) -> ProductoResult<Option<Producto>>;

    /// Inserts when `id` is `None` (assigning one), otherwise replaces the
    /// stored product with the same id. Returns the product as stored.
    async fn save(&self, producto: Producto) -> ProductoResult<Producto>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: &str) -> ProductoResult<bool>;
}

/// Persistence of categories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoriaRepository: Send + Sync {
    async fn find_all(&self) -> ProductoResult<Vec<Categoria>>;

    async fn find_by_id(&self, id: &str) -> ProductoResult<Option<Categoria>>;

    /// Same insert-or-replace semantics as [`ProductoRepository::save`].
    async fn save(&self, categoria: Categoria) -> ProductoResult<Categoria>;
}
