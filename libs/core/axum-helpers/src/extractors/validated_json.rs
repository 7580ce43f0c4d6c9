use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor that also runs `validator` rules.
///
/// Parse failures and rule violations are both rejected with [`AppError`];
/// violations carry the per-field errors in `details`.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct NewCategoria {
///     #[validate(length(min = 1))]
///     nombre: String,
/// }
///
/// async fn create(ValidatedJson(input): ValidatedJson<NewCategoria>) -> String {
///     input.nombre
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(Self(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::JsonBody;
    use axum::{Router, body::Body, http::Request as HttpRequest, http::StatusCode, routing::post};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Named {
        #[validate(length(min = 1))]
        nombre: String,
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/validated",
                post(|ValidatedJson(input): ValidatedJson<Named>| async move { input.nombre }),
            )
            .route(
                "/plain",
                post(|JsonBody(input): JsonBody<Named>| async move { input.nombre }),
            )
    }

    async fn send(uri: &str, body: &'static str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(
                HttpRequest::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_validated_json_rejects_rule_violation() {
        let (status, json) = send("/validated", r#"{"nombre":""}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "VALIDATION_ERROR");
        assert!(json["details"]["nombre"].is_array());
    }

    #[tokio::test]
    async fn test_json_body_skips_validation() {
        let (status, _) = send("/plain", r#"{"nombre":""}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_body() {
        let (status, json) = send("/plain", r#"{"nombre":"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "JSON_EXTRACTION");
    }
}
