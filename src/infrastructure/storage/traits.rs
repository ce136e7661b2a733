use async_trait::async_trait;

use super::error::StorageError;

/// Key-addressed binary object storage for event images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `key`, replacing any previous object.
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StorageError>;

    /// Read the whole object stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete the object under `key`.
    ///
    /// Returns `StorageError::NotFound` when nothing is stored there.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// URL the browser can load the object from.
    fn public_url(&self, key: &str) -> String;
}
