use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::ViewCache,
    entities::content::{
        ContentBlock, ContentBody, ContentDraft, GalleryImage, NewGalleryContent, NewImageContent,
        NewImageTextContent, NewTextContent,
    },
    errors::AppError,
    feed::{ChangeEvent, ChangeFeed},
    repositories::event::EventRepository,
    storage::{
        layout::{content_image_key, ImageSlot},
        ObjectStorage,
    },
    use_cases::images::{discard_images, remove_images, store_image, StoredImage},
    utils::valid_uuid::valid_uuid,
};

pub struct ContentHandler {
    pub event_repo: Arc<dyn EventRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub view_cache: Arc<ViewCache>,
    pub change_feed: ChangeFeed,
}

impl ContentHandler {
    pub fn new(
        event_repo: Arc<dyn EventRepository>,
        storage: Arc<dyn ObjectStorage>,
        view_cache: Arc<ViewCache>,
        change_feed: ChangeFeed,
    ) -> Self {
        ContentHandler {
            event_repo,
            storage,
            view_cache,
            change_feed,
        }
    }

    /// Content of an event, oldest first.
    pub async fn list_content(&self, event_id: &str) -> Result<Vec<ContentBlock>, AppError> {
        let event_id = self.existing_event(event_id).await?;
        self.event_repo.list_content(&event_id).await
    }

    pub async fn add_text(&self, event_id: &str, request: NewTextContent) -> Result<ContentBlock, AppError> {
        request.validate()?;
        let event_id = self.existing_event(event_id).await?;

        let body = ContentBody::Text {
            value: request.text.trim().to_string(),
        };
        self.save_block(event_id, body, &[]).await
    }

    pub async fn add_image(&self, event_id: &str, request: NewImageContent) -> Result<ContentBlock, AppError> {
        request.validate()?;
        let event_id = self.existing_event(event_id).await?;

        let key = content_image_key(&event_id, Utc::now(), ImageSlot::Single);
        let image = store_image(&self.storage, key, &request.upload).await?;

        let body = ContentBody::Image {
            value: image.url.clone(),
            image_path: image.key.clone(),
            width: image.width,
            height: image.height,
        };
        self.save_block(event_id, body, std::slice::from_ref(&image)).await
    }

    pub async fn add_gallery(&self, event_id: &str, request: NewGalleryContent) -> Result<ContentBlock, AppError> {
        request.validate()?;
        let event_id = self.existing_event(event_id).await?;

        let now = Utc::now();
        let mut stored: Vec<StoredImage> = Vec::with_capacity(request.images.len());
        for (index, upload) in request.images.iter().enumerate() {
            let key = content_image_key(&event_id, now, ImageSlot::Gallery(index));
            match store_image(&self.storage, key, upload).await {
                Ok(image) => stored.push(image),
                Err(e) => {
                    discard_images(&self.storage, &stored).await;
                    return Err(e);
                }
            }
        }

        let body = ContentBody::Gallery {
            images: stored
                .iter()
                .map(|image| GalleryImage {
                    value: image.url.clone(),
                    image_path: image.key.clone(),
                    width: image.width,
                    height: image.height,
                })
                .collect(),
        };
        self.save_block(event_id, body, &stored).await
    }

    pub async fn add_image_text(
        &self,
        event_id: &str,
        request: NewImageTextContent,
    ) -> Result<ContentBlock, AppError> {
        request.validate()?;
        let event_id = self.existing_event(event_id).await?;

        let key = content_image_key(&event_id, Utc::now(), ImageSlot::WithText);
        let image = store_image(&self.storage, key, &request.upload).await?;

        let body = ContentBody::ImageText {
            image_url: image.url.clone(),
            image_path: image.key.clone(),
            width: image.width,
            height: image.height,
            text: request.text.trim().to_string(),
            image_position: request.image_position,
        };
        self.save_block(event_id, body, std::slice::from_ref(&image)).await
    }

    /// Dispatches any block submission to its dedicated operation.
    pub async fn submit(&self, event_id: &str, draft: ContentDraft) -> Result<ContentBlock, AppError> {
        match draft {
            ContentDraft::Text(request) => self.add_text(event_id, request).await,
            ContentDraft::Image(request) => self.add_image(event_id, request).await,
            ContentDraft::Gallery(request) => self.add_gallery(event_id, request).await,
            ContentDraft::ImageText(request) => self.add_image_text(event_id, request).await,
        }
    }

    /// Deletes the block's images (tolerating missing ones), then the record.
    pub async fn delete_content(&self, event_id: &str, content_id: &str) -> Result<(), AppError> {
        let event_id = valid_uuid(event_id)?;
        let content_id = valid_uuid(content_id)?;

        let block = self
            .event_repo
            .get_content(&event_id, &content_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Content {} not found", content_id)))?;

        remove_images(&self.storage, block.body.image_paths()).await?;
        self.event_repo.delete_content(&event_id, &content_id).await?;

        self.view_cache.invalidate_event(&event_id);
        self.change_feed.publish(ChangeEvent::ContentRemoved { event_id, content_id });
        tracing::info!(%event_id, %content_id, kind = block.body.kind(), "Content deleted");
        Ok(())
    }

    async fn existing_event(&self, event_id: &str) -> Result<Uuid, AppError> {
        let event_id = valid_uuid(event_id)?;
        match self.event_repo.get_event(&event_id).await? {
            Some(_) => Ok(event_id),
            None => Err(AppError::NotFound(format!("Event {} not found", event_id))),
        }
    }

    async fn save_block(
        &self,
        event_id: Uuid,
        body: ContentBody,
        uploaded: &[StoredImage],
    ) -> Result<ContentBlock, AppError> {
        let block = ContentBlock {
            id: Uuid::new_v4(),
            event_id,
            created_at: Utc::now(),
            body,
        };

        if let Err(e) = self.event_repo.add_content(&block).await {
            tracing::error!(%event_id, error = %e, "Content insert failed");
            discard_images(&self.storage, uploaded).await;
            return Err(e);
        }

        self.view_cache.invalidate_event(&event_id);
        self.change_feed.publish(ChangeEvent::ContentAdded {
            event_id,
            content_id: block.id,
        });
        tracing::info!(%event_id, content_id = %block.id, kind = block.body.kind(), "Content added");
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::{content::ImagePosition, event::Event, image::ImageUpload},
        repositories::event::MockEventRepository,
        storage::{MockObjectStorage, StorageError},
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;
    use std::time::Duration;

    fn upload() -> ImageUpload {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(16, 16))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        ImageUpload {
            image: format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner())),
            crop: None,
        }
    }

    fn some_event(id: Uuid) -> Event {
        Event {
            id,
            title: "Picnic".into(),
            description: "Una tarde en el parque".into(),
            image_url: "u".into(),
            image_path: "events/1_picnic.jpg".into(),
            created_at: Utc::now(),
            width: None,
            height: None,
        }
    }

    fn handler(repo: MockEventRepository, storage: MockObjectStorage) -> ContentHandler {
        ContentHandler::new(
            Arc::new(repo),
            Arc::new(storage),
            Arc::new(ViewCache::new(Duration::from_secs(60))),
            ChangeFeed::default(),
        )
    }

    #[tokio::test]
    async fn short_text_is_rejected_without_any_call() {
        // No expectations: any repository or storage call would panic.
        let handler = handler(MockEventRepository::new(), MockObjectStorage::new());
        let err = handler
            .add_text(&Uuid::new_v4().to_string(), NewTextContent { text: "hola".into() })
            .await
            .unwrap_err();

        match err {
            AppError::ValidationError(fields) => {
                assert_eq!(fields[0].field, "text");
                assert!(fields[0].message.contains("too short"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn text_block_is_trimmed_and_recorded() {
        let event_id = Uuid::new_v4();
        let mut repo = MockEventRepository::new();
        repo.expect_get_event().returning(|id| Ok(Some(some_event(*id))));
        repo.expect_add_content()
            .withf(move |block| {
                block.event_id == event_id && block.body == ContentBody::Text { value: "Fue precioso".into() }
            })
            .times(1)
            .returning(|_| Ok(()));

        let handler = handler(repo, MockObjectStorage::new());
        let mut changes = handler.change_feed.receiver();
        let block = handler
            .add_text(&event_id.to_string(), NewTextContent { text: "  Fue precioso ".into() })
            .await
            .unwrap();

        assert_eq!(
            changes.try_recv().unwrap(),
            ChangeEvent::ContentAdded { event_id, content_id: block.id }
        );
    }

    #[tokio::test]
    async fn content_for_unknown_event_is_not_found() {
        let mut repo = MockEventRepository::new();
        repo.expect_get_event().returning(|_| Ok(None));

        let handler = handler(repo, MockObjectStorage::new());
        let err = handler
            .add_text(&Uuid::new_v4().to_string(), NewTextContent { text: "Fue precioso".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn gallery_images_get_distinct_keys() {
        let event_id = Uuid::new_v4();
        let mut repo = MockEventRepository::new();
        let mut storage = MockObjectStorage::new();

        repo.expect_get_event().returning(|id| Ok(Some(some_event(*id))));
        storage.expect_put().times(3).returning(|_, _| Ok(()));
        storage.expect_public_url().returning(|key| format!("http://localhost/media/{}", key));
        repo.expect_add_content().times(1).returning(|_| Ok(()));

        let handler = handler(repo, storage);
        let block = handler
            .add_gallery(&event_id.to_string(), NewGalleryContent { images: vec![upload(), upload(), upload()] })
            .await
            .unwrap();

        let paths = block.body.image_paths();
        assert_eq!(paths.len(), 3);
        for (i, path) in paths.iter().enumerate() {
            assert!(path.starts_with(&format!("events/{}/content/", event_id)));
            assert!(path.ends_with(&format!("_{}.jpg", i)));
        }
    }

    #[tokio::test]
    async fn failed_gallery_upload_discards_earlier_images() {
        let mut repo = MockEventRepository::new();
        let mut storage = MockObjectStorage::new();

        repo.expect_get_event().returning(|id| Ok(Some(some_event(*id))));
        storage
            .expect_put()
            .returning(|key, _| {
                if key.ends_with("_1.jpg") {
                    Err(StorageError::Io(std::io::Error::other("disk full")))
                } else {
                    Ok(())
                }
            });
        storage.expect_public_url().returning(|key| key.to_string());
        storage
            .expect_delete()
            .withf(|key| key.ends_with("_0.jpg"))
            .times(1)
            .returning(|_| Ok(()));

        let handler = handler(repo, storage);
        let err = handler
            .add_gallery(&Uuid::new_v4().to_string(), NewGalleryContent { images: vec![upload(), upload()] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StorageFailure(_)));
    }

    #[tokio::test]
    async fn image_text_keeps_position() {
        let mut repo = MockEventRepository::new();
        let mut storage = MockObjectStorage::new();

        repo.expect_get_event().returning(|id| Ok(Some(some_event(*id))));
        storage
            .expect_put()
            .withf(|key, _| key.ends_with("_text.jpg"))
            .times(1)
            .returning(|_, _| Ok(()));
        storage.expect_public_url().returning(|key| key.to_string());
        repo.expect_add_content().times(1).returning(|_| Ok(()));

        let handler = handler(repo, storage);
        let block = handler
            .add_image_text(
                &Uuid::new_v4().to_string(),
                NewImageTextContent {
                    upload: upload(),
                    text: "Bajo la lluvia".into(),
                    image_position: ImagePosition::Right,
                },
            )
            .await
            .unwrap();

        match block.body {
            ContentBody::ImageText { image_position, text, .. } => {
                assert_eq!(image_position, ImagePosition::Right);
                assert_eq!(text, "Bajo la lluvia");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_content_tolerates_missing_image() {
        let event_id = Uuid::new_v4();
        let content_id = Uuid::new_v4();
        let mut repo = MockEventRepository::new();
        let mut storage = MockObjectStorage::new();

        repo.expect_get_content().returning(move |event_id, content_id| {
            Ok(Some(ContentBlock {
                id: *content_id,
                event_id: *event_id,
                created_at: Utc::now(),
                body: ContentBody::Image {
                    value: "u".into(),
                    image_path: "events/x/content/1.jpg".into(),
                    width: 1,
                    height: 1,
                },
            }))
        });
        storage
            .expect_delete()
            .times(1)
            .returning(|key| Err(StorageError::NotFound(key.to_string())));
        repo.expect_delete_content().times(1).returning(|_, _| Ok(()));

        let handler = handler(repo, storage);
        handler
            .delete_content(&event_id.to_string(), &content_id.to_string())
            .await
            .unwrap();
    }
}
