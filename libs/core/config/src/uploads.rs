use crate::{env_parse_or, env_required, ConfigError, FromEnv};
use std::path::PathBuf;

/// Default per-request limit for multipart uploads (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Where uploaded files are written and how large they may be.
#[derive(Clone, Debug)]
pub struct UploadsConfig {
    pub path: PathBuf,
    pub max_file_size: usize,
}

impl UploadsConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }
}

impl FromEnv for UploadsConfig {
    /// - UPLOADS_PATH: required, the directory photos are stored in
    /// - UPLOADS_MAX_FILE_SIZE: optional, in bytes (default 10 MiB)
    fn from_env() -> Result<Self, ConfigError> {
        let path = env_required("UPLOADS_PATH")?;
        let max_file_size = env_parse_or("UPLOADS_MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?;

        Ok(Self {
            path: PathBuf::from(path),
            max_file_size,
        })
    }
}
