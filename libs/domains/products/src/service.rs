//! Producto service - business logic layer

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ProductoError, ProductoResult};
use crate::models::{Categoria, EditProducto, NewProducto, Producto};
use crate::repository::{CategoriaRepository, ProductoRepository};
use crate::storage::{FileStream, PhotoStore, photo_filename};
use crate::validation::field_errors;

/// Facade over the product and category repositories and the photo store.
pub struct ProductoService<P: ProductoRepository, C: CategoriaRepository> {
    productos: Arc<P>,
    categorias: Arc<C>,
    photos: Arc<dyn PhotoStore>,
}

impl<P: ProductoRepository, C: CategoriaRepository> Clone for ProductoService<P, C> {
    fn clone(&self) -> Self {
        Self {
            productos: Arc::clone(&self.productos),
            categorias: Arc::clone(&self.categorias),
            photos: Arc::clone(&self.photos),
        }
    }
}

impl<P: ProductoRepository, C: CategoriaRepository> ProductoService<P, C> {
    pub fn new(productos: P, categorias: C, photos: impl PhotoStore + 'static) -> Self {
        Self {
            productos: Arc::new(productos),
            categorias: Arc::new(categorias),
            photos: Arc::new(photos),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> ProductoResult<Vec<Producto>> {
        self.productos.find_all().await
    }

    /// Every product with its `nombre` upper-cased.
    #[instrument(skip(self))]
    pub async fn list_with_uppercase_names(&self) -> ProductoResult<Vec<Producto>> {
        let productos = self.productos.find_all().await?;
        Ok(productos
            .into_iter()
            .map(Producto::with_uppercase_nombre)
            .collect())
    }

    /// [`Self::list_with_uppercase_names`] concatenated `times` times.
    #[instrument(skip(self))]
    pub async fn list_with_uppercase_names_repeated(
        &self,
        times: usize,
    ) -> ProductoResult<Vec<Producto>> {
        let productos = self.list_with_uppercase_names().await?;
        let mut repeated = Vec::with_capacity(productos.len() * times);
        for _ in 0..times {
            repeated.extend(productos.iter().cloned());
        }
        Ok(repeated)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> ProductoResult<Producto> {
        self.productos
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProductoError::NotFound(format!("producto {id}")))
    }

    /// Persists as-is, stamping `create_at` if it is still empty.
    #[instrument(skip(self, producto), fields(producto_id = ?producto.id))]
    pub async fn save(&self, mut producto: Producto) -> ProductoResult<Producto> {
        producto.ensure_create_at(Utc::now());
        self.productos.save(producto).await
    }

    /// Validates and inserts a new product.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewProducto) -> ProductoResult<Producto> {
        input
            .validate()
            .map_err(|e| ProductoError::Validation(field_errors(&e)))?;

        let created = self.save(Producto::from(input)).await?;
        tracing::info!(producto_id = ?created.id, "Producto created");
        Ok(created)
    }

    /// Applies `nombre`, `precio` and `categoria` to an existing product.
    #[instrument(skip(self, edit))]
    pub async fn update(&self, id: &str, edit: EditProducto) -> ProductoResult<Producto> {
        let mut producto = self.find_by_id(id).await?;
        producto.apply_edit(edit);
        self.productos.save(producto).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> ProductoResult<()> {
        if self.productos.delete(id).await? {
            tracing::info!("Producto deleted");
            Ok(())
        } else {
            Err(ProductoError::NotFound(format!("producto {id}")))
        }
    }

    /// Streams a photo into the store under a fresh unique name and returns it.
    #[instrument(skip(self, stream))]
    pub async fn store_photo(
        &self,
        original_filename: &str,
        stream: FileStream<'_>,
    ) -> ProductoResult<String> {
        let filename = photo_filename(original_filename);
        self.photos.transfer_to(&filename, stream).await?;
        Ok(filename)
    }

    /// Removes a stored photo that ended up unreferenced.
    pub async fn discard_photo(&self, filename: &str) {
        if let Err(e) = self.photos.remove(filename).await {
            tracing::error!(filename, error = %e, "Failed to discard photo");
        }
    }

    /// Stores the photo, then points `producto.foto` at it and saves.
    ///
    /// The product is untouched when the transfer fails; the photo is removed
    /// again when the save fails.
    #[instrument(skip(self, producto, stream), fields(producto_id = ?producto.id))]
    pub async fn attach_photo(
        &self,
        mut producto: Producto,
        original_filename: &str,
        stream: FileStream<'_>,
    ) -> ProductoResult<Producto> {
        let filename = self.store_photo(original_filename, stream).await?;
        producto.foto = Some(filename.clone());

        match self.save(producto).await {
            Ok(saved) => Ok(saved),
            Err(e) => {
                self.discard_photo(&filename).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn list_categorias(&self) -> ProductoResult<Vec<Categoria>> {
        self.categorias.find_all().await
    }

    #[instrument(skip(self))]
    pub async fn find_categoria(&self, id: &str) -> ProductoResult<Categoria> {
        self.categorias
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProductoError::NotFound(format!("categoria {id}")))
    }

    #[instrument(skip(self, categoria), fields(nombre = %categoria.nombre))]
    pub async fn save_categoria(&self, categoria: Categoria) -> ProductoResult<Categoria> {
        self.categorias.save(categoria).await
    }
}
