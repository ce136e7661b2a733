use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::layout::validate_key;
use super::traits::ObjectStorage;

/// Filesystem-backed object store.
///
/// Objects live at `{base_path}/{key}`; writes go through `{base_path}/.tmp`
/// and are renamed into place so readers never see a partial file.
pub struct FilesystemObjectStorage {
    base_path: PathBuf,
    public_base_url: String,
    max_size: usize,
}

impl FilesystemObjectStorage {
    pub async fn new(
        base_path: PathBuf,
        public_base_url: &str,
        max_size: usize,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_size,
        })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ObjectStorage for FilesystemObjectStorage {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StorageError> {
        if data.len() > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len(),
                limit: self.max_size,
            });
        }

        let object_path = self.object_path(key)?;
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, &data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(key, size = data.len(), "Object stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let object_path = self.object_path(key)?;
        match fs::read(&object_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let object_path = self.object_path(key)?;
        match fs::remove_file(&object_path).await {
            Ok(()) => {
                tracing::debug!(key, "Object deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/media/{}", self.public_base_url, key)
    }
}
