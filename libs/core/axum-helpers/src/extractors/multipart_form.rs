use crate::errors::AppError;
use axum::extract::{FromRequest, Multipart, Request};

/// [`Multipart`] whose rejection (wrong content type, missing boundary) uses
/// the shared JSON error body.
///
/// Only the request head is inspected here; parts are read by the handler.
pub struct MultipartForm(pub Multipart);

impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        Ok(Self(multipart))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request as HttpRequest, http::StatusCode, routing::post};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn count_parts(MultipartForm(mut multipart): MultipartForm) -> Result<String, AppError> {
        let mut names = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            names.push(field.name().unwrap_or_default().to_string());
        }
        Ok(names.join(","))
    }

    fn app() -> Router {
        Router::new().route("/form", post(count_parts))
    }

    #[tokio::test]
    async fn test_reads_parts() {
        let body = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"nombre\"\r\n\r\n\
            Mouse\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"precio\"\r\n\r\n\
            25.5\r\n\
            --XyZ--\r\n";
        let response = app()
            .oneshot(
                HttpRequest::post("/form")
                    .header("content-type", "multipart/form-data; boundary=XyZ")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"nombre,precio");
    }

    #[tokio::test]
    async fn test_wrong_content_type_uses_error_body() {
        let response = app()
            .oneshot(
                HttpRequest::post("/form")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "MULTIPART_ERROR");
    }
}
