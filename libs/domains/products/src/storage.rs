//! Storage of uploaded product photos.

use async_trait::async_trait;
use axum::body::Bytes;
use futures_util::TryStreamExt;
use futures_util::stream::BoxStream;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductoError, ProductoResult};

/// Body of an uploaded file part, chunk by chunk.
pub type FileStream<'a> = BoxStream<'a, ProductoResult<Bytes>>;

/// Destination for photo uploads.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Writes the whole stream under `filename` and returns the byte count.
    ///
    /// On any error (from the stream or the write) nothing is left behind
    /// under `filename`.
    async fn transfer_to(&self, filename: &str, stream: FileStream<'_>) -> ProductoResult<u64>;

    /// Deletes a stored photo; a missing file is not an error.
    async fn remove(&self, filename: &str) -> ProductoResult<()>;
}

/// Drops the characters that are never kept in stored photo names.
pub fn sanitize_filename(original: &str) -> String {
    original
        .chars()
        .filter(|c| !matches!(c, ' ' | ':' | '\\'))
        .collect()
}

/// `<uuid-v4>-<sanitised original>`, unique per upload.
pub fn photo_filename(original: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_filename(original))
}

/// [`PhotoStore`] writing into a local directory with `tokio::fs`.
#[derive(Debug, Clone)]
pub struct LocalPhotoStore {
    base_path: PathBuf,
}

impl LocalPhotoStore {
    /// Uses `base_path`, creating it if missing.
    pub async fn new(base_path: impl Into<PathBuf>) -> ProductoResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ProductoError::Upload(format!(
                "failed to create upload directory {}: {}",
                base_path.display(),
                e
            ))
        })?;
        tracing::info!(path = %base_path.display(), "Upload directory ready");
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Stored names are a single plain path component directly under the
    /// base directory.
    fn path_for(&self, filename: &str) -> ProductoResult<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !filename.contains('/') => {
                Ok(self.base_path.join(filename))
            }
            _ => Err(ProductoError::InvalidInput(format!(
                "invalid file name '{filename}'"
            ))),
        }
    }
}

async fn write_stream(path: &Path, mut stream: FileStream<'_>) -> ProductoResult<u64> {
    let mut file = fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = stream.try_next().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

#[async_trait]
impl PhotoStore for LocalPhotoStore {
    #[instrument(skip(self, stream))]
    async fn transfer_to(&self, filename: &str, stream: FileStream<'_>) -> ProductoResult<u64> {
        let path = self.path_for(filename)?;

        match write_stream(&path, stream).await {
            Ok(written) => {
                tracing::info!(bytes = written, "Photo stored");
                Ok(written)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Photo transfer failed, removing partial file");
                if let Err(remove_err) = fs::remove_file(&path).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        tracing::error!(error = %remove_err, "Failed to remove partial file");
                    }
                }
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    async fn remove(&self, filename: &str) -> ProductoResult<()> {
        let path = self.path_for(filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunks(parts: Vec<ProductoResult<&'static str>>) -> FileStream<'static> {
        Box::pin(stream::iter(parts.into_iter().map(|part| {
            part.map(|s| Bytes::from_static(s.as_bytes()))
        })))
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my photo:one.png"), "myphotoone.png");
        assert_eq!(sanitize_filename(r"C:\fotos\mouse 1.jpg"), "Cfotosmouse1.jpg");
        assert_eq!(sanitize_filename("plain.png"), "plain.png");
    }

    #[test]
    fn test_photo_filename_has_unique_prefix() {
        let first = photo_filename("my photo:one.png");
        let second = photo_filename("my photo:one.png");

        assert_ne!(first, second);
        let (token, rest) = first.split_at(36);
        assert!(Uuid::parse_str(token).is_ok());
        assert_eq!(rest, "-myphotoone.png");
    }

    #[tokio::test]
    async fn test_transfer_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPhotoStore::new(dir.path()).await.unwrap();

        let written = store
            .transfer_to("a-photo.png", chunks(vec![Ok("hello "), Ok("world")]))
            .await
            .unwrap();

        assert_eq!(written, 11);
        let content = tokio::fs::read(dir.path().join("a-photo.png")).await.unwrap();
        assert_eq!(content, b"hello world");
    }

    #[tokio::test]
    async fn test_failed_transfer_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPhotoStore::new(dir.path()).await.unwrap();

        let result = store
            .transfer_to(
                "broken.png",
                chunks(vec![
                    Ok("partial"),
                    Err(ProductoError::Upload("connection reset".into())),
                ]),
            )
            .await;

        assert!(matches!(result, Err(ProductoError::Upload(_))));
        assert!(!dir.path().join("broken.png").exists());
    }

    #[tokio::test]
    async fn test_new_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads").join("fotos");

        let store = LocalPhotoStore::new(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.base_path(), nested.as_path());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPhotoStore::new(dir.path()).await.unwrap();

        let result = store
            .transfer_to("x-../../etc/passwd", chunks(vec![Ok("nope")]))
            .await;
        assert!(matches!(result, Err(ProductoError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_rejects_non_plain_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPhotoStore::new(dir.path()).await.unwrap();

        for name in ["", ".", "..", "fotos/a.png", "a.png/", "/etc/passwd"] {
            let result = store.transfer_to(name, chunks(vec![Ok("nope")])).await;
            assert!(
                matches!(result, Err(ProductoError::InvalidInput(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_accepts_consecutive_dots_inside_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPhotoStore::new(dir.path()).await.unwrap();

        let written = store
            .transfer_to("x-vacaciones..2024.png", chunks(vec![Ok("png")]))
            .await
            .unwrap();

        assert_eq!(written, 3);
        assert!(dir.path().join("x-vacaciones..2024.png").is_file());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPhotoStore::new(dir.path()).await.unwrap();
        assert!(store.remove("never-written.png").await.is_ok());
    }
}
