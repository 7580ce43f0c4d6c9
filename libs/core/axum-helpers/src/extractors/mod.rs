//! Request extractors whose rejections go through [`crate::AppError`].

pub mod json_body;
pub mod multipart_form;
pub mod validated_json;

pub use json_body::JsonBody;
pub use multipart_form::MultipartForm;
pub use validated_json::ValidatedJson;
