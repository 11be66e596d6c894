//! Object storage for uploaded center images.

use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Route prefix under which stored objects are served.
pub const MEDIA_PREFIX: &str = "/media";

/// Image uploads are capped at 10 MB.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync + Debug {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public URL path of a stored object.
    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", MEDIA_PREFIX, key)
    }
}

/// Stores objects as files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Keys are relative paths made of plain segments only.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !plain {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl ObjectStorage for LocalStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        info!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} already gone", path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Lowercased extension of an uploaded file name, if it is an allowed image
/// type.
pub fn image_extension(file_name: &str) -> Option<String> {
    let extension = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_IMAGE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}
