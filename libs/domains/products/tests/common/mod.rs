//! In-memory repositories and request helpers shared by the handler tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use domain_products::{
    Categoria, CategoriaRepository, LocalPhotoStore, Producto, ProductoRepository,
    ProductoResult, ProductoService, handlers,
};
use http_body_util::BodyExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;
use tokio::sync::RwLock;
use tower::ServiceExt;

pub const BOUNDARY: &str = "X-PRODUCTOS-BOUNDARY";
pub const PRODUCTS_BASE: &str = "/api/products";
pub const V2_PRODUCTS_BASE: &str = "/api/v2/products";
pub const CATEGORIES_BASE: &str = "/api/categories";
pub const MAX_FILE_SIZE: usize = 64 * 1024;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> String {
    format!("{:024x}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Default)]
pub struct InMemoryProductos {
    items: RwLock<BTreeMap<String, Producto>>,
}

#[async_trait]
impl ProductoRepository for InMemoryProductos {
    async fn find_all(&self) -> ProductoResult<Vec<Producto>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> ProductoResult<Option<Producto>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn save(&self, mut producto: Producto) -> ProductoResult<Producto> {
        let id = producto.id.get_or_insert_with(next_id).clone();
        self.items.write().await.insert(id, producto.clone());
        Ok(producto)
    }

    async fn delete(&self, id: &str) -> ProductoResult<bool> {
        Ok(self.items.write().await.remove(id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryCategorias {
    items: RwLock<BTreeMap<String, Categoria>>,
}

#[async_trait]
impl CategoriaRepository for InMemoryCategorias {
    async fn find_all(&self) -> ProductoResult<Vec<Categoria>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> ProductoResult<Option<Categoria>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn save(&self, mut categoria: Categoria) -> ProductoResult<Categoria> {
        let id = categoria.id.get_or_insert_with(next_id).clone();
        self.items.write().await.insert(id, categoria.clone());
        Ok(categoria)
    }
}

pub type TestService = ProductoService<InMemoryProductos, InMemoryCategorias>;

/// Routers over one shared service and a temporary upload directory.
///
/// `mounted` nests both product route families the way `products-api` does
/// (minus the outer `/api` prefix).
pub struct TestApp {
    pub productos: Router,
    pub categorias: Router,
    pub mounted: Router,
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let service: TestService = ProductoService::new(
            InMemoryProductos::default(),
            InMemoryCategorias::default(),
            LocalPhotoStore::new(uploads.path()).await.unwrap(),
        );

        let mounted = Router::new()
            .nest(
                "/products",
                handlers::router(service.clone(), PRODUCTS_BASE, MAX_FILE_SIZE),
            )
            .nest(
                "/v2/products",
                handlers::router(service.clone(), V2_PRODUCTS_BASE, MAX_FILE_SIZE),
            );

        Self {
            productos: handlers::router(service.clone(), PRODUCTS_BASE, MAX_FILE_SIZE),
            categorias: handlers::categorias_router(service, CATEGORIES_BASE),
            mounted,
            uploads,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.productos.clone().oneshot(request).await.unwrap()
    }

    pub async fn send_mounted(&self, request: Request<Body>) -> Response<Body> {
        self.mounted.clone().oneshot(request).await.unwrap()
    }

    pub async fn send_categorias(&self, request: Request<Body>) -> Response<Body> {
        self.categorias.clone().oneshot(request).await.unwrap()
    }

    /// File names currently in the upload directory.
    pub fn stored_files(&self) -> Vec<String> {
        std::fs::read_dir(self.uploads.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// One part of a multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, filename, content) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn json_body<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}
