//! HTTP handlers for the Productos and Categorias APIs

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State, multipart::Field},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_helpers::{
    JsonBody, MultipartForm, ValidatedJson,
    errors::responses::{
        BadRequestMultipartResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        PayloadTooLargeResponse,
    },
};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::error::{ProductoError, ProductoResult};
use crate::models::{Categoria, EditProducto, NewCategoria, NewProducto, Producto};
use crate::repository::{CategoriaRepository, ProductoRepository};
use crate::service::ProductoService;
use crate::validation::FieldError;

pub const MENSAJE_CREADO: &str = "Producto creado con éxito";
pub const MENSAJE_ERROR_CREAR: &str = "Error al crear el producto";

/// Name of the multipart part carrying the photo.
const FILE_PART: &str = "file";

/// OpenAPI documentation for the Productos API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_productos,
        create_producto,
        get_producto,
        update_producto,
        delete_producto,
        upload_foto,
        create_with_foto,
    ),
    components(
        schemas(
            Producto, Categoria, NewProducto, EditProducto,
            ProductoCreado, ErroresProducto, FotoMultipart, ProductoMultipart
        ),
        responses(
            BadRequestMultipartResponse,
            InternalServerErrorResponse,
            PayloadTooLargeResponse
        )
    ),
    tags(
        (name = "Productos", description = "Product management endpoints")
    )
)]
pub struct ApiDoc;

/// OpenAPI documentation for the Categorias API
#[derive(OpenApi)]
#[openapi(
    paths(list_categorias, get_categoria, create_categoria),
    components(
        schemas(Categoria, NewCategoria),
        responses(BadRequestValidationResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "Categorias", description = "Category management endpoints")
    )
)]
pub struct CategoriasApiDoc;

/// Body of a successful `POST /products`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductoCreado {
    pub producto: Producto,
    #[schema(example = "Producto creado con éxito")]
    pub mensaje: String,
    pub timestamp: DateTime<Utc>,
    #[schema(example = 201)]
    pub status: u16,
}

/// Body of a `POST /products` rejected by field validation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErroresProducto {
    pub errors: Vec<String>,
    #[schema(example = "Error al crear el producto")]
    pub mensaje: String,
    pub timestamp: DateTime<Utc>,
    #[schema(example = 400)]
    pub status: u16,
}

impl ProductoCreado {
    fn new(producto: Producto) -> Self {
        Self {
            producto,
            mensaje: MENSAJE_CREADO.to_string(),
            timestamp: Utc::now(),
            status: StatusCode::CREATED.as_u16(),
        }
    }
}

impl ErroresProducto {
    fn new(errors: &[FieldError]) -> Self {
        Self {
            errors: errors.iter().map(ToString::to_string).collect(),
            mensaje: MENSAJE_ERROR_CREAR.to_string(),
            timestamp: Utc::now(),
            status: StatusCode::BAD_REQUEST.as_u16(),
        }
    }
}

/// Multipart body of `POST /products/upload/{id}` (documentation only).
#[derive(ToSchema)]
pub struct FotoMultipart {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Multipart body of `POST /products/create` (documentation only).
#[derive(Serialize, ToSchema)]
pub struct ProductoMultipart {
    #[schema(example = "Mouse")]
    pub nombre: String,
    #[schema(example = 25.5)]
    pub precio: f64,
    #[serde(rename = "categoria.id")]
    pub categoria_id: String,
    #[serde(rename = "categoria.nombre")]
    pub categoria_nombre: String,
    #[serde(rename = "createAt")]
    pub create_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Shared state of one mounted route family.
pub struct HandlerState<P: ProductoRepository, C: CategoriaRepository> {
    service: ProductoService<P, C>,
    location_base: String,
}

impl<P: ProductoRepository, C: CategoriaRepository> HandlerState<P, C> {
    fn location(&self, id: Option<&str>) -> String {
        format!("{}/{}", self.location_base, id.unwrap_or_default())
    }
}

fn created<T: Serialize>(location: String, body: T) -> Response {
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(body),
    )
        .into_response()
}

/// Create the products router.
///
/// Routes are relative to the mount point. The `products-api` binary nests
/// this router at `/products` and `/v2/products` inside the `/api` prefix
/// added by `axum_helpers::create_router`, so clients call
/// `/api/products`, `/api/products/{id}`, `/api/products/upload/{id}`,
/// `/api/products/create` (and the same under `/api/v2/products`).
///
/// `location_base` is that public path (`/api/products`) and prefixes every
/// `Location` header. `max_file_size` caps the request body of the two
/// multipart routes.
pub fn router<P, C>(
    service: ProductoService<P, C>,
    location_base: impl Into<String>,
    max_file_size: usize,
) -> Router
where
    P: ProductoRepository + 'static,
    C: CategoriaRepository + 'static,
{
    let state = Arc::new(HandlerState {
        service,
        location_base: location_base.into(),
    });

    let uploads = Router::new()
        .route("/upload/{id}", post(upload_foto::<P, C>))
        .route("/create", post(create_with_foto::<P, C>))
        .layer(DefaultBodyLimit::max(max_file_size));

    Router::new()
        .route("/", get(list_productos::<P, C>).post(create_producto::<P, C>))
        .route(
            "/{id}",
            get(get_producto::<P, C>)
                .put(update_producto::<P, C>)
                .delete(delete_producto::<P, C>),
        )
        .merge(uploads)
        .with_state(state)
}

/// List every product
#[utoipa::path(
    get,
    path = "",
    tag = "Productos",
    responses(
        (status = 200, description = "All products", body = Vec<Producto>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_productos<P: ProductoRepository, C: CategoriaRepository>(
    State(state): State<Arc<HandlerState<P, C>>>,
) -> ProductoResult<Json<Vec<Producto>>> {
    let productos = state.service.list().await?;
    Ok(Json(productos))
}

/// Create a product
#[utoipa::path(
    post,
    path = "",
    tag = "Productos",
    request_body = NewProducto,
    responses(
        (status = 201, description = "Product created", body = ProductoCreado,
            headers(("Location" = String, description = "URL of the new product"))),
        (status = 400, description = "Field validation failed", body = ErroresProducto),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_producto<P: ProductoRepository, C: CategoriaRepository>(
    State(state): State<Arc<HandlerState<P, C>>>,
    JsonBody(input): JsonBody<NewProducto>,
) -> ProductoResult<Response> {
    let producto = match state.service.create(input).await {
        Ok(producto) => producto,
        Err(ProductoError::Validation(errors)) => {
            tracing::debug!(count = errors.len(), "Producto rejected by validation");
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ErroresProducto::new(&errors)),
            )
                .into_response());
        }
        Err(e) => return Err(e),
    };

    let location = state.location(producto.id.as_deref());
    Ok(created(location, ProductoCreado::new(producto)))
}

/// Get a product by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Productos",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = Producto),
        (status = 404, description = "Product not found, empty body"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_producto<P: ProductoRepository, C: CategoriaRepository>(
    State(state): State<Arc<HandlerState<P, C>>>,
    Path(id): Path<String>,
) -> ProductoResult<Json<Producto>> {
    let producto = state.service.find_by_id(&id).await?;
    Ok(Json(producto))
}

/// Replace `nombre`, `precio` and `categoria` of a product
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Productos",
    params(("id" = String, Path, description = "Product id")),
    request_body = EditProducto,
    responses(
        (status = 201, description = "Product updated", body = Producto,
            headers(("Location" = String, description = "URL of the product"))),
        (status = 404, description = "Product not found, empty body"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_producto<P: ProductoRepository, C: CategoriaRepository>(
    State(state): State<Arc<HandlerState<P, C>>>,
    Path(id): Path<String>,
    JsonBody(edit): JsonBody<EditProducto>,
) -> ProductoResult<Response> {
    let producto = state.service.update(&id, edit).await?;
    Ok(created(state.location(producto.id.as_deref()), producto))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Productos",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found, empty body"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_producto<P: ProductoRepository, C: CategoriaRepository>(
    State(state): State<Arc<HandlerState<P, C>>>,
    Path(id): Path<String>,
) -> ProductoResult<StatusCode> {
    state.service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload the photo of an existing product
#[utoipa::path(
    post,
    path = "/upload/{id}",
    tag = "Productos",
    params(("id" = String, Path, description = "Product id")),
    request_body(content = FotoMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Photo stored and product updated", body = Producto),
        (status = 400, response = BadRequestMultipartResponse),
        (status = 404, description = "Product not found, empty body"),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn upload_foto<P: ProductoRepository, C: CategoriaRepository>(
    State(state): State<Arc<HandlerState<P, C>>>,
    Path(id): Path<String>,
    MultipartForm(mut multipart): MultipartForm,
) -> ProductoResult<Json<Producto>> {
    let producto = state.service.find_by_id(&id).await?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_PART) {
            continue;
        }
        let original = field.file_name().unwrap_or_default().to_string();
        let saved = state
            .service
            .attach_photo(producto, &original, file_stream(field))
            .await?;
        return Ok(Json(saved));
    }

    Err(missing_file())
}

/// Create a product from a form, with its photo
#[utoipa::path(
    post,
    path = "/create",
    tag = "Productos",
    request_body(content = ProductoMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = Producto,
            headers(("Location" = String, description = "URL of the new product"))),
        (status = 400, response = BadRequestMultipartResponse),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_with_foto<P: ProductoRepository, C: CategoriaRepository>(
    State(state): State<Arc<HandlerState<P, C>>>,
    MultipartForm(mut multipart): MultipartForm,
) -> ProductoResult<Response> {
    let mut foto = None;

    let saved = match read_producto_form(&state.service, &mut multipart, &mut foto).await {
        Ok(producto) => state.service.save(producto).await,
        Err(e) => Err(e),
    };

    match saved {
        Ok(producto) => Ok(created(state.location(producto.id.as_deref()), producto)),
        Err(e) => {
            if let Some(filename) = foto {
                state.service.discard_photo(&filename).await;
            }
            Err(e)
        }
    }
}

fn file_stream(field: Field<'_>) -> crate::storage::FileStream<'_> {
    Box::pin(field.map_err(ProductoError::from))
}

fn missing_file() -> ProductoError {
    ProductoError::InvalidInput(format!("missing multipart part '{FILE_PART}'"))
}

/// Text parts of the create form, kept as sent until all parts are read.
#[derive(Debug, Default)]
struct ProductoForm {
    nombre: Option<String>,
    precio: Option<String>,
    categoria_id: Option<String>,
    categoria_nombre: Option<String>,
    create_at: Option<String>,
}

impl ProductoForm {
    fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "nombre" => &mut self.nombre,
            "precio" => &mut self.precio,
            "categoria.id" => &mut self.categoria_id,
            "categoria.nombre" => &mut self.categoria_nombre,
            "createAt" => &mut self.create_at,
            _ => return,
        };
        *slot = Some(value);
    }

    fn into_producto(self) -> ProductoResult<Producto> {
        let precio = non_empty(self.precio)
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|precio| precio.is_finite())
                    .ok_or_else(|| {
                        ProductoError::InvalidInput(format!("precio '{raw}' is not a number"))
                    })
            })
            .transpose()?;

        let create_at = non_empty(self.create_at)
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| {
                        ProductoError::InvalidInput(format!("createAt '{raw}' is not RFC 3339"))
                    })
            })
            .transpose()?;

        let categoria = if self.categoria_id.is_some() || self.categoria_nombre.is_some() {
            Some(Categoria {
                id: non_empty(self.categoria_id),
                nombre: self.categoria_nombre.unwrap_or_default(),
            })
        } else {
            None
        };

        Ok(Producto {
            id: None,
            nombre: self.nombre.unwrap_or_default(),
            precio,
            categoria,
            create_at,
            foto: None,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Reads every part of the create form, streaming the photo into the store
/// as soon as it arrives. `foto` holds the stored name once written, so the
/// caller can discard it on any later failure.
async fn read_producto_form<P: ProductoRepository, C: CategoriaRepository>(
    service: &ProductoService<P, C>,
    multipart: &mut axum::extract::Multipart,
    foto: &mut Option<String>,
) -> ProductoResult<Producto> {
    let mut form = ProductoForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == FILE_PART {
            if foto.is_some() {
                return Err(ProductoError::InvalidInput(format!(
                    "multipart part '{FILE_PART}' sent more than once"
                )));
            }
            let original = field.file_name().unwrap_or_default().to_string();
            *foto = Some(service.store_photo(&original, file_stream(field)).await?);
        } else {
            let value = field.text().await?;
            form.set(&name, value);
        }
    }

    let filename = foto.clone().ok_or_else(missing_file)?;
    let mut producto = form.into_producto()?;
    producto.foto = Some(filename);
    Ok(producto)
}

/// Create the categories router.
///
/// Served at `/api/categories` by `products-api`; `location_base` is that
/// path and prefixes `Location` headers.
pub fn categorias_router<P, C>(
    service: ProductoService<P, C>,
    location_base: impl Into<String>,
) -> Router
where
    P: ProductoRepository + 'static,
    C: CategoriaRepository + 'static,
{
    let state = Arc::new(HandlerState {
        service,
        location_base: location_base.into(),
    });

    Router::new()
        .route(
            "/",
            get(list_categorias::<P, C>).post(create_categoria::<P, C>),
        )
        .route("/{id}", get(get_categoria::<P, C>))
        .with_state(state)
}

/// List every category
#[utoipa::path(
    get,
    path = "",
    tag = "Categorias",
    responses(
        (status = 200, description = "All categories", body = Vec<Categoria>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_categorias<P: ProductoRepository, C: CategoriaRepository>(
    State(state): State<Arc<HandlerState<P, C>>>,
) -> ProductoResult<Json<Vec<Categoria>>> {
    let categorias = state.service.list_categorias().await?;
    Ok(Json(categorias))
}

/// Get a category by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Categorias",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category found", body = Categoria),
        (status = 404, description = "Category not found, empty body"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_categoria<P: ProductoRepository, C: CategoriaRepository>(
    State(state): State<Arc<HandlerState<P, C>>>,
    Path(id): Path<String>,
) -> ProductoResult<Json<Categoria>> {
    let categoria = state.service.find_categoria(&id).await?;
    Ok(Json(categoria))
}

/// Create a category
#[utoipa::path(
    post,
    path = "",
    tag = "Categorias",
    request_body = NewCategoria,
    responses(
        (status = 201, description = "Category created", body = Categoria,
            headers(("Location" = String, description = "URL of the new category"))),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_categoria<P: ProductoRepository, C: CategoriaRepository>(
    State(state): State<Arc<HandlerState<P, C>>>,
    ValidatedJson(input): ValidatedJson<NewCategoria>,
) -> ProductoResult<Response> {
    let categoria = state.service.save_categoria(input.into()).await?;
    Ok(created(state.location(categoria.id.as_deref()), categoria))
}
