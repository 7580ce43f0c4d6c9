use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::not_blank;

/// Product category, stored in its own collection and embedded by value
/// inside [`Producto`].
///
/// The validation rules apply to the embedded form: a product must reference
/// an existing category by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Categoria {
    /// ObjectId hex, `None` before the first save
    #[validate(
        required(message = "no puede estar vacío"),
        custom(function = "not_blank", message = "no puede estar vacío")
    )]
    #[schema(example = "65f1c0ffee0000000000c001")]
    pub id: Option<String>,
    #[serde(default)]
    #[schema(example = "Electrónica")]
    pub nombre: String,
}

/// Product entity as exposed over HTTP.
///
/// Every field is always serialised, `null` included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Producto {
    /// ObjectId hex assigned by the store on first save
    pub id: Option<String>,
    pub nombre: String,
    pub precio: Option<f64>,
    pub categoria: Option<Categoria>,
    /// Set once, on creation
    pub create_at: Option<DateTime<Utc>>,
    /// Stored file name of the uploaded photo
    pub foto: Option<String>,
}

/// Body of `POST /products`. Clients cannot choose `id` or `foto`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProducto {
    #[validate(
        required(message = "no puede estar vacío"),
        custom(function = "not_blank", message = "no puede estar vacío")
    )]
    #[schema(example = "Mouse")]
    pub nombre: Option<String>,
    #[validate(required(message = "no puede ser nulo"))]
    #[schema(example = 25.5)]
    pub precio: Option<f64>,
    #[validate(required(message = "no puede ser nulo"), nested)]
    pub categoria: Option<Categoria>,
    pub create_at: Option<DateTime<Utc>>,
}

/// Body of `PUT /products/{id}`; only these fields are ever changed by an edit.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EditProducto {
    #[serde(default)]
    pub nombre: String,
    pub precio: Option<f64>,
    pub categoria: Option<Categoria>,
}

/// Body of `POST /categories`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewCategoria {
    #[validate(custom(function = "not_blank", message = "no puede estar vacío"))]
    #[serde(default)]
    #[schema(example = "Electrónica")]
    pub nombre: String,
}

impl From<NewProducto> for Producto {
    fn from(input: NewProducto) -> Self {
        Self {
            id: None,
            nombre: input.nombre.unwrap_or_default(),
            precio: input.precio,
            categoria: input.categoria,
            create_at: input.create_at,
            foto: None,
        }
    }
}

impl From<NewCategoria> for Categoria {
    fn from(input: NewCategoria) -> Self {
        Self {
            id: None,
            nombre: input.nombre,
        }
    }
}

impl Producto {
    /// Copies the editable fields; `id`, `create_at` and `foto` are untouched.
    pub fn apply_edit(&mut self, edit: EditProducto) {
        self.nombre = edit.nombre;
        self.precio = edit.precio;
        self.categoria = edit.categoria;
    }

    /// Stamps `create_at` with `now` unless it is already set.
    pub fn ensure_create_at(&mut self, now: DateTime<Utc>) {
        self.create_at.get_or_insert(now);
    }

    /// The same product with `nombre` upper-cased.
    pub fn with_uppercase_nombre(mut self) -> Self {
        self.nombre = self.nombre.to_uppercase();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Producto {
        Producto {
            id: Some("65f1c0ffee0000000000a001".into()),
            nombre: "Mouse".into(),
            precio: Some(25.5),
            categoria: Some(Categoria {
                id: Some("c1".into()),
                nombre: "Electrónica".into(),
            }),
            create_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
            foto: Some("abc-mouse.png".into()),
        }
    }

    #[test]
    fn test_producto_serializes_camel_case_with_nulls() {
        let producto = Producto {
            nombre: "Teclado".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&producto).unwrap();

        assert_eq!(json["nombre"], "Teclado");
        assert!(json["id"].is_null());
        assert!(json.get("createAt").is_some());
        assert!(json.get("foto").is_some());
        assert!(json.get("create_at").is_none());
    }

    #[test]
    fn test_create_at_is_rfc3339() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["createAt"], "2024-03-01T12:00:00Z");
    }

    #[test]
    fn test_apply_edit_keeps_identity_fields() {
        let mut producto = sample();
        producto.apply_edit(EditProducto {
            nombre: "Mouse inalámbrico".into(),
            precio: Some(30.0),
            categoria: None,
        });

        assert_eq!(producto.nombre, "Mouse inalámbrico");
        assert_eq!(producto.precio, Some(30.0));
        assert_eq!(producto.categoria, None);
        assert_eq!(producto.id, sample().id);
        assert_eq!(producto.create_at, sample().create_at);
        assert_eq!(producto.foto, sample().foto);
    }

    #[test]
    fn test_ensure_create_at_never_overwrites() {
        let later = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

        let mut existing = sample();
        existing.ensure_create_at(later);
        assert_eq!(existing.create_at, sample().create_at);

        let mut fresh = Producto::default();
        fresh.ensure_create_at(later);
        assert_eq!(fresh.create_at, Some(later));
    }

    #[test]
    fn test_new_producto_ignores_client_id_and_foto() {
        let input: NewProducto = serde_json::from_str(
            r#"{"id":"x","foto":"y.png","nombre":"Mouse","precio":25.5,"categoria":{"id":"c1","nombre":"Electronics"}}"#,
        )
        .unwrap();
        let producto = Producto::from(input);

        assert_eq!(producto.id, None);
        assert_eq!(producto.foto, None);
        assert_eq!(producto.nombre, "Mouse");
    }

    #[test]
    fn test_with_uppercase_nombre() {
        assert_eq!(sample().with_uppercase_nombre().nombre, "MOUSE");
    }
}
