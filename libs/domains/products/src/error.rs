use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

use crate::validation::FieldError;

#[derive(Debug, Error)]
pub enum ProductoError {
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<FieldError>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductoResult<T> = Result<T, ProductoError>;

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ProductoError> for AppError {
    fn from(err: ProductoError) -> Self {
        match err {
            ProductoError::Validation(errors) => AppError::BadRequest(join(&errors)),
            ProductoError::NotFound(what) => AppError::NotFound(what),
            ProductoError::InvalidInput(msg) => AppError::BadRequest(msg),
            ProductoError::Multipart(e) => AppError::Multipart(e),
            ProductoError::Database(msg) => AppError::Database(msg),
            ProductoError::Upload(msg) => AppError::InternalServerError(format!("upload: {msg}")),
            ProductoError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

/// Not-found is answered with a bare 404; everything else uses the shared
/// JSON error body.
impl IntoResponse for ProductoError {
    fn into_response(self) -> Response {
        match self {
            ProductoError::NotFound(what) => {
                tracing::debug!(resource = %what, "Resource not found");
                StatusCode::NOT_FOUND.into_response()
            }
            other => AppError::from(other).into_response(),
        }
    }
}

impl From<mongodb::error::Error> for ProductoError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductoError::Database(err.to_string())
    }
}

impl From<std::io::Error> for ProductoError {
    fn from(err: std::io::Error) -> Self {
        ProductoError::Upload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_not_found_has_empty_body() {
        let response = ProductoError::NotFound("producto 42".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_upload_error_is_500_without_details() {
        let err = ProductoError::from(std::io::Error::other("disk full"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "INTERNAL_ERROR");
        assert!(!json["message"].as_str().unwrap().contains("disk full"));
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let err = ProductoError::Validation(vec![FieldError {
            field: "nombre".into(),
            message: "no puede estar vacío".into(),
        }]);
        assert_eq!(
            err.to_string(),
            "Validation failed: El campo nombre no puede estar vacío"
        );
    }
}
