//! MongoDB implementations of the repositories
//!
//! Documents keep `_id` as an ObjectId and `createAt` as a BSON datetime
//! (millisecond precision); the domain types see a hex string and a
//! `chrono::DateTime<Utc>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{self, doc, oid::ObjectId},
    options::ReplaceOptions,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ProductoError, ProductoResult};
use crate::models::{Categoria, Producto};
use crate::repository::{CategoriaRepository, ProductoRepository};

pub const PRODUCTOS_COLLECTION: &str = "productos";
pub const CATEGORIAS_COLLECTION: &str = "categorias";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductoDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    nombre: String,
    precio: Option<f64>,
    categoria: Option<Categoria>,
    #[serde(rename = "createAt")]
    create_at: Option<bson::DateTime>,
    foto: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoriaDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    nombre: String,
}

/// `None` for ids that are not 24-char ObjectId hex strings.
fn parse_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// Existing id, or a fresh one for a first save.
fn id_for_save(id: Option<&str>) -> ProductoResult<ObjectId> {
    match id {
        None => Ok(ObjectId::new()),
        Some(raw) => parse_id(raw)
            .ok_or_else(|| ProductoError::InvalidInput(format!("'{raw}' is not a valid id"))),
    }
}

fn to_bson_datetime(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(value.timestamp_millis())
}

fn from_bson_datetime(value: bson::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value.timestamp_millis())
}

impl TryFrom<Producto> for ProductoDocument {
    type Error = ProductoError;

    fn try_from(producto: Producto) -> ProductoResult<Self> {
        Ok(Self {
            id: id_for_save(producto.id.as_deref())?,
            nombre: producto.nombre,
            precio: producto.precio,
            categoria: producto.categoria,
            create_at: producto.create_at.map(to_bson_datetime),
            foto: producto.foto,
        })
    }
}

impl From<ProductoDocument> for Producto {
    fn from(document: ProductoDocument) -> Self {
        Self {
            id: Some(document.id.to_hex()),
            nombre: document.nombre,
            precio: document.precio,
            categoria: document.categoria,
            create_at: document.create_at.and_then(from_bson_datetime),
            foto: document.foto,
        }
    }
}

impl TryFrom<Categoria> for CategoriaDocument {
    type Error = ProductoError;

    fn try_from(categoria: Categoria) -> ProductoResult<Self> {
        Ok(Self {
            id: id_for_save(categoria.id.as_deref())?,
            nombre: categoria.nombre,
        })
    }
}

impl From<CategoriaDocument> for Categoria {
    fn from(document: CategoriaDocument) -> Self {
        Self {
            id: Some(document.id.to_hex()),
            nombre: document.nombre,
        }
    }
}

fn upsert() -> ReplaceOptions {
    ReplaceOptions::builder().upsert(true).build()
}

/// [`ProductoRepository`] over the `productos` collection
pub struct MongoProductoRepository {
    collection: Collection<ProductoDocument>,
}

impl MongoProductoRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, PRODUCTOS_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }
}

#[async_trait]
impl ProductoRepository for MongoProductoRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> ProductoResult<Vec<Producto>> {
        let cursor = self.collection.find(doc! {}).await?;
        let documents: Vec<ProductoDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Producto::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> ProductoResult<Option<Producto>> {
        let Some(oid) = parse_id(id) else {
            tracing::debug!("Not an ObjectId, treating as missing");
            return Ok(None);
        };
        let document = self.collection.find_one(doc! { "_id": oid }).await?;
        Ok(document.map(Producto::from))
    }

    #[instrument(skip(self, producto), fields(producto_id = ?producto.id))]
    async fn save(&self, producto: Producto) -> ProductoResult<Producto> {
        let is_new = producto.id.is_none();
        let document = ProductoDocument::try_from(producto)?;

        if is_new {
            self.collection.insert_one(&document).await?;
            tracing::info!(producto_id = %document.id, "Producto inserted");
        } else {
            self.collection
                .replace_one(doc! { "_id": document.id }, &document)
                .with_options(upsert())
                .await?;
            tracing::debug!(producto_id = %document.id, "Producto replaced");
        }

        Ok(document.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> ProductoResult<bool> {
        let Some(oid) = parse_id(id) else {
            return Ok(false);
        };
        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count > 0)
    }
}

/// [`CategoriaRepository`] over the `categorias` collection
pub struct MongoCategoriaRepository {
    collection: Collection<CategoriaDocument>,
}

impl MongoCategoriaRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, CATEGORIAS_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }
}

#[async_trait]
impl CategoriaRepository for MongoCategoriaRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> ProductoResult<Vec<Categoria>> {
        let cursor = self.collection.find(doc! {}).await?;
        let documents: Vec<CategoriaDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Categoria::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> ProductoResult<Option<Categoria>> {
        let Some(oid) = parse_id(id) else {
            return Ok(None);
        };
        let document = self.collection.find_one(doc! { "_id": oid }).await?;
        Ok(document.map(Categoria::from))
    }

    #[instrument(skip(self, categoria), fields(nombre = %categoria.nombre))]
    async fn save(&self, categoria: Categoria) -> ProductoResult<Categoria> {
        let document = CategoriaDocument::try_from(categoria)?;
        self.collection
            .replace_one(doc! { "_id": document.id }, &document)
            .with_options(upsert())
            .await?;
        tracing::info!(categoria_id = %document.id, "Categoria saved");
        Ok(document.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_id_rejects_malformed() {
        assert!(parse_id("65f1c0ffee0000000000a001").is_some());
        assert!(parse_id("123").is_none());
        assert!(parse_id("zzzzzzzzzzzzzzzzzzzzzzzz").is_none());
    }

    #[test]
    fn test_new_producto_gets_generated_id() {
        let document = ProductoDocument::try_from(Producto {
            nombre: "Mouse".into(),
            ..Default::default()
        })
        .unwrap();
        let producto = Producto::from(document);
        assert_eq!(producto.id.as_deref().map(str::len), Some(24));
    }

    #[test]
    fn test_existing_id_is_kept() {
        let id = "65f1c0ffee0000000000a001".to_string();
        let document = ProductoDocument::try_from(Producto {
            id: Some(id.clone()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(document.id.to_hex(), id);
    }

    #[test]
    fn test_malformed_id_on_save_is_invalid_input() {
        let result = ProductoDocument::try_from(Producto {
            id: Some("not-an-id".into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(ProductoError::InvalidInput(_))));
    }

    #[test]
    fn test_create_at_truncated_to_millis() {
        let precise = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let document = ProductoDocument::try_from(Producto {
            create_at: Some(precise),
            ..Default::default()
        })
        .unwrap();

        let stored = Producto::from(document).create_at.unwrap();
        assert_eq!(stored.timestamp_millis(), precise.timestamp_millis());
        assert_eq!(stored.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_document_field_names() {
        let document = ProductoDocument::try_from(Producto {
            nombre: "Mouse".into(),
            create_at: Some(Utc::now()),
            ..Default::default()
        })
        .unwrap();
        let bson = bson::to_document(&document).unwrap();

        assert!(bson.get_object_id("_id").is_ok());
        assert!(bson.get_datetime("createAt").is_ok());
        assert_eq!(bson.get_str("nombre").unwrap(), "Mouse");
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_producto_repository_roundtrip() {
        let url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = mongodb::Client::with_uri_str(&url).await.unwrap();
        let repository = MongoProductoRepository::with_collection(
            &client.database("productos_test"),
            "productos_roundtrip",
        );

        let saved = repository
            .save(Producto {
                nombre: "Mouse".into(),
                precio: Some(25.5),
                create_at: Some(Utc::now()),
                ..Default::default()
            })
            .await
            .unwrap();
        let id = saved.id.clone().unwrap();

        assert_eq!(repository.find_by_id(&id).await.unwrap(), Some(saved));
        assert!(repository.delete(&id).await.unwrap());
        assert_eq!(repository.find_by_id(&id).await.unwrap(), None);
    }
}
