use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("invalid photo file name '{0}'")]
    InvalidName(String),

    #[error("photo could not be stored: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
pub trait PhotoStore: Send + Sync {
    /// Store `bytes` under `file_name`, replacing any previous file.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<(), PhotoError>;
}

/// Photos as plain files in one directory.
#[derive(Debug, Clone)]
pub struct LocalPhotoStore {
    dir: PathBuf,
}

impl LocalPhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl PhotoStore for LocalPhotoStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<(), PhotoError> {
        let plain = Path::new(file_name).file_name().and_then(|n| n.to_str()) == Some(file_name);
        if !plain {
            return Err(PhotoError::InvalidName(file_name.to_string()));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(file_name), bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPhotoStore::new(dir.path().join("uploads"));
        store.save("photo_1.jpg", b"jpeg").await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("uploads/photo_1.jpg")).unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPhotoStore::new(dir.path());
        assert!(matches!(
            store.save("../escape.jpg", b"x").await,
            Err(PhotoError::InvalidName(_))
        ));
    }
}
