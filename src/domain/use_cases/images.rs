use std::sync::Arc;

use crate::{
    entities::image::ImageUpload,
    errors::AppError,
    imaging::{crop_and_resize, DataUri},
    storage::{ObjectStorage, StorageError},
};

/// An image that now lives in object storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Decodes, crops and bounds `upload`, then stores the JPEG under `key`.
pub async fn store_image(
    storage: &Arc<dyn ObjectStorage>,
    key: String,
    upload: &ImageUpload,
) -> Result<StoredImage, AppError> {
    let source = DataUri::parse(&upload.image)?;
    let region = upload.crop_region();

    let cropped = tokio::task::spawn_blocking(move || crop_and_resize(&source.data, region))
        .await
        .map_err(|e| AppError::InternalError(format!("Image worker failed: {}", e)))??;

    let (width, height) = (cropped.width, cropped.height);
    storage.put(&key, cropped.bytes).await.map_err(|e| {
        tracing::error!(key = %key, error = %e, "Image upload failed");
        AppError::from(e)
    })?;

    Ok(StoredImage {
        url: storage.public_url(&key),
        key,
        width,
        height,
    })
}

/// Deletes the objects behind a record. Already-missing objects are logged and skipped.
pub async fn remove_images<I, S>(storage: &Arc<dyn ObjectStorage>, keys: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for key in keys {
        let key = key.as_ref();
        if key.is_empty() {
            continue;
        }
        match storage.delete(key).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                tracing::warn!(key, "Image already missing from storage, continuing");
            }
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to delete image");
                return Err(e.into());
            }
        }
    }
    Ok(())
}

/// Best-effort cleanup of objects uploaded for a record that was never written.
pub async fn discard_images(storage: &Arc<dyn ObjectStorage>, images: &[StoredImage]) {
    for image in images {
        if let Err(e) = storage.delete(&image.key).await {
            tracing::warn!(key = %image.key, error = %e, "Could not discard orphaned upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockObjectStorage;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_upload(width: u32, height: u32) -> ImageUpload {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        ImageUpload {
            image: format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner())),
            crop: None,
        }
    }

    #[tokio::test]
    async fn stored_image_carries_key_url_and_size() {
        let mut storage = MockObjectStorage::new();
        storage
            .expect_put()
            .withf(|key, data| key.to_string() == "events/1_a.jpg" && !data.is_empty())
            .times(1)
            .returning(|_, _| Ok(()));
        storage
            .expect_public_url()
            .returning(|key| format!("http://localhost/media/{}", key));
        let storage: Arc<dyn ObjectStorage> = Arc::new(storage);

        let stored = store_image(&storage, "events/1_a.jpg".into(), &png_upload(40, 20)).await.unwrap();
        assert_eq!(stored.url, "http://localhost/media/events/1_a.jpg");
        assert_eq!((stored.width, stored.height), (40, 20));
    }

    #[tokio::test]
    async fn undecodable_image_never_reaches_storage() {
        let storage: Arc<dyn ObjectStorage> = Arc::new(MockObjectStorage::new());
        let upload = ImageUpload {
            image: "data:image/png;base64,aGVsbG8=".into(),
            crop: None,
        };
        let err = store_image(&storage, "events/1_a.jpg".into(), &upload).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidImage(_)));
    }

    #[tokio::test]
    async fn missing_objects_are_tolerated_on_removal() {
        let mut storage = MockObjectStorage::new();
        storage
            .expect_delete()
            .returning(|key| if key == "gone" { Err(StorageError::NotFound(key.into())) } else { Ok(()) })
            .times(2);
        let storage: Arc<dyn ObjectStorage> = Arc::new(storage);

        assert!(remove_images(&storage, ["present", "gone", ""]).await.is_ok());
    }

    #[tokio::test]
    async fn other_storage_failures_abort_removal() {
        let mut storage = MockObjectStorage::new();
        storage
            .expect_delete()
            .times(1)
            .returning(|_| Err(StorageError::Io(std::io::Error::other("disk"))));
        let storage: Arc<dyn ObjectStorage> = Arc::new(storage);

        let err = remove_images(&storage, ["a", "b"]).await.unwrap_err();
        assert!(matches!(err, AppError::StorageFailure(_)));
    }
}
