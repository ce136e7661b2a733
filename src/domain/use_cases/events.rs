use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    cache::ViewCache,
    use_cases::images::{discard_images, remove_images, store_image},
    entities::event::{Event, EventInsert, EventPage, NewEventRequest},
    errors::AppError,
    feed::{ChangeEvent, ChangeFeed},
    repositories::event::EventRepository,
    storage::{layout::cover_image_key, ObjectStorage},
    utils::valid_uuid::valid_uuid,
};

pub struct EventHandler {
    pub event_repo: Arc<dyn EventRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub view_cache: Arc<ViewCache>,
    pub change_feed: ChangeFeed,
}

impl EventHandler {
    pub fn new(
        event_repo: Arc<dyn EventRepository>,
        storage: Arc<dyn ObjectStorage>,
        view_cache: Arc<ViewCache>,
        change_feed: ChangeFeed,
    ) -> Self {
        EventHandler {
            event_repo,
            storage,
            view_cache,
            change_feed,
        }
    }

    /// Validates the form, stores the cover image and writes the event record.
    pub async fn create_event(&self, request: NewEventRequest) -> Result<Event, AppError> {
        request.validate()?;
        let created_at = request
            .date
            .ok_or_else(|| AppError::invalid("date", "A date is required"))?;

        let key = cover_image_key(&request.title, Utc::now());
        let cover = store_image(&self.storage, key, &request.upload).await?;

        let insert = EventInsert {
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            image_url: cover.url.clone(),
            image_path: cover.key.clone(),
            created_at,
            width: Some(cover.width),
            height: Some(cover.height),
        };

        let event = match self.event_repo.create_event(&insert).await {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Event insert failed, discarding cover image");
                discard_images(&self.storage, std::slice::from_ref(&cover)).await;
                return Err(e);
            }
        };

        self.view_cache.invalidate_listing();
        self.change_feed.publish(ChangeEvent::EventCreated { event_id: event.id });
        tracing::info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    /// All events, newest first.
    pub async fn list_events(&self) -> Result<Arc<Vec<Event>>, AppError> {
        if let Some(events) = self.view_cache.listing() {
            return Ok(events);
        }
        let ticket = self.view_cache.ticket();
        let events = self.event_repo.list_events().await?;
        Ok(self.view_cache.store_listing(ticket, events))
    }

    /// The event with its content in timeline order.
    pub async fn get_event_page(&self, event_id: &str) -> Result<Arc<EventPage>, AppError> {
        let event_id = valid_uuid(event_id)?;
        if let Some(page) = self.view_cache.page(&event_id) {
            return Ok(page);
        }

        let ticket = self.view_cache.ticket();
        let event = self
            .event_repo
            .get_event(&event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;
        let content = self.event_repo.list_content(&event_id).await?;

        Ok(self.view_cache.store_page(ticket, EventPage::new(event, content)))
    }

    /// Removes, in order: content images, content records, the cover image, the event record.
    pub async fn delete_event(&self, event_id: &str) -> Result<(), AppError> {
        let event_id = valid_uuid(event_id)?;
        let event = self
            .event_repo
            .get_event(&event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

        let content = self.event_repo.list_content(&event_id).await?;

        for block in &content {
            remove_images(&self.storage, block.body.image_paths()).await?;
        }
        for block in &content {
            self.event_repo.delete_content(&event_id, &block.id).await?;
        }

        remove_images(&self.storage, [event.image_path.as_str()]).await?;
        self.event_repo.delete_event(&event_id).await?;

        self.view_cache.invalidate_event(&event_id);
        self.change_feed.publish(ChangeEvent::EventDeleted { event_id });
        tracing::info!(%event_id, blocks = content.len(), "Event deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::{
            content::{ContentBlock, ContentBody, GalleryImage},
            image::ImageUpload,
        },
        repositories::event::MockEventRepository,
        storage::{MockObjectStorage, StorageError},
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use chrono::{DateTime, TimeZone};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use mockall::{predicate::eq, Sequence};
    use std::io::Cursor;
    use std::time::Duration;
    use uuid::Uuid;

    fn png_data_uri() -> String {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(32, 24))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner()))
    }

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 14, 18, 30, 0).unwrap()
    }

    fn event(id: Uuid) -> Event {
        Event {
            id,
            title: "Picnic".into(),
            description: "Una tarde en el parque".into(),
            image_url: "http://localhost/media/events/1_picnic.jpg".into(),
            image_path: "events/1_picnic.jpg".into(),
            created_at: date(),
            width: Some(32),
            height: Some(24),
        }
    }

    fn handler(repo: MockEventRepository, storage: MockObjectStorage) -> (EventHandler, ChangeFeed) {
        let feed = ChangeFeed::default();
        let handler = EventHandler::new(
            Arc::new(repo),
            Arc::new(storage),
            Arc::new(ViewCache::new(Duration::from_secs(60))),
            feed.clone(),
        );
        (handler, feed)
    }

    fn request(title: &str, description: &str) -> NewEventRequest {
        NewEventRequest {
            title: title.into(),
            description: description.into(),
            upload: ImageUpload {
                image: png_data_uri(),
                crop: None,
            },
            date: Some(date()),
        }
    }

    #[tokio::test]
    async fn create_event_keeps_title_and_supplied_date() {
        let mut repo = MockEventRepository::new();
        let mut storage = MockObjectStorage::new();

        storage
            .expect_put()
            .withf(|key, _| key.starts_with("events/") && key.ends_with("_t.jpg"))
            .times(1)
            .returning(|_, _| Ok(()));
        storage
            .expect_public_url()
            .returning(|key| format!("http://localhost/media/{}", key));
        repo.expect_create_event().times(1).returning(|insert| {
            Ok(Event {
                id: Uuid::new_v4(),
                title: insert.title.clone(),
                description: insert.description.clone(),
                image_url: insert.image_url.clone(),
                image_path: insert.image_path.clone(),
                created_at: insert.created_at,
                width: insert.width,
                height: insert.height,
            })
        });

        let (handler, _) = handler(repo, storage);
        let event = handler
            .create_event(request("T", "Una tarde en la playa"))
            .await
            .unwrap();

        assert_eq!(event.title, "T");
        assert_eq!(event.description, "Una tarde en la playa");
        assert!(!event.image_url.is_empty());
        assert_eq!(event.created_at, date());
        assert_eq!((event.width, event.height), (Some(32), Some(24)));
    }

    #[tokio::test]
    async fn invalid_event_is_rejected_before_any_write() {
        let (handler, _) = handler(MockEventRepository::new(), MockObjectStorage::new());

        let mut missing_date = request("Picnic", "Una tarde en el parque");
        missing_date.date = None;
        assert!(handler.create_event(missing_date).await.unwrap_err().is_validation());

        assert!(handler.create_event(request("  ", "Una tarde en el parque")).await.unwrap_err().is_validation());
        assert!(handler.create_event(request("Picnic", "short")).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn failed_insert_discards_uploaded_cover() {
        let mut repo = MockEventRepository::new();
        let mut storage = MockObjectStorage::new();

        storage.expect_put().times(1).returning(|_, _| Ok(()));
        storage.expect_public_url().returning(|key| key.to_string());
        repo.expect_create_event()
            .times(1)
            .returning(|_| Err(AppError::InternalError("database down".into())));
        storage
            .expect_delete()
            .withf(|key| key.starts_with("events/"))
            .times(1)
            .returning(|_| Ok(()));

        let (handler, _) = handler(repo, storage);
        let err = handler.create_event(request("Picnic", "Una tarde en el parque")).await.unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }

    #[tokio::test]
    async fn delete_event_removes_images_then_records_in_order() {
        let event_id = Uuid::new_v4();
        let image_block = ContentBlock {
            id: Uuid::new_v4(),
            event_id,
            created_at: date(),
            body: ContentBody::Image {
                value: "u".into(),
                image_path: format!("events/{}/content/1.jpg", event_id),
                width: 10,
                height: 10,
            },
        };
        let gallery_block = ContentBlock {
            id: Uuid::new_v4(),
            event_id,
            created_at: date() + chrono::Duration::minutes(1),
            body: ContentBody::Gallery {
                images: (0..3)
                    .map(|i| GalleryImage {
                        value: "u".into(),
                        image_path: format!("events/{}/content/2_{}.jpg", event_id, i),
                        width: 10,
                        height: 10,
                    })
                    .collect(),
            },
        };

        let mut repo = MockEventRepository::new();
        let mut storage = MockObjectStorage::new();
        let mut seq = Sequence::new();

        repo.expect_get_event()
            .with(eq(event_id))
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |id| Ok(Some(event(*id))));
        let blocks = vec![image_block.clone(), gallery_block.clone()];
        repo.expect_list_content()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(blocks.clone()));

        let content_keys = vec![
            format!("events/{}/content/1.jpg", event_id),
            format!("events/{}/content/2_0.jpg", event_id),
            format!("events/{}/content/2_1.jpg", event_id),
            format!("events/{}/content/2_2.jpg", event_id),
        ];
        for (i, key) in content_keys.into_iter().enumerate() {
            storage
                .expect_delete()
                .withf(move |k| k.to_string() == key)
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |k| {
                    // The second gallery image was already removed.
                    if i == 2 { Err(StorageError::NotFound(k.to_string())) } else { Ok(()) }
                });
        }

        for block_id in [image_block.id, gallery_block.id] {
            repo.expect_delete_content()
                .with(eq(event_id), eq(block_id))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        storage
            .expect_delete()
            .withf(|k| k.to_string() == "events/1_picnic.jpg")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        repo.expect_delete_event()
            .with(eq(event_id))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let (handler, feed) = handler(repo, storage);
        let mut changes = feed.receiver();

        handler.delete_event(&event_id.to_string()).await.unwrap();
        assert_eq!(changes.try_recv().unwrap(), ChangeEvent::EventDeleted { event_id });
    }

    #[tokio::test]
    async fn deleting_unknown_event_is_not_found() {
        let mut repo = MockEventRepository::new();
        repo.expect_get_event().returning(|_| Ok(None));

        let (handler, _) = handler(repo, MockObjectStorage::new());
        let err = handler.delete_event(&Uuid::new_v4().to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn event_page_is_served_from_cache_until_invalidated() {
        let event_id = Uuid::new_v4();
        let mut repo = MockEventRepository::new();
        repo.expect_get_event().times(2).returning(|id| Ok(Some(event(*id))));
        repo.expect_list_content().times(2).returning(|_| Ok(vec![]));

        let (handler, _) = handler(repo, MockObjectStorage::new());
        let id = event_id.to_string();

        handler.get_event_page(&id).await.unwrap();
        handler.get_event_page(&id).await.unwrap();
        handler.view_cache.invalidate_event(&event_id);
        let page = handler.get_event_page(&id).await.unwrap();
        assert_eq!(page.event.id, event_id);
    }

    #[tokio::test]
    async fn page_read_overtaken_by_a_mutation_is_not_cached() {
        let event_id = Uuid::new_v4();
        let cache = Arc::new(ViewCache::new(Duration::from_secs(60)));
        let stored = ContentBlock {
            id: Uuid::new_v4(),
            event_id,
            created_at: date(),
            body: ContentBody::Text { value: "Llegamos de noche".into() },
        };

        let mut repo = MockEventRepository::new();
        repo.expect_get_event().returning(|id| Ok(Some(event(*id))));
        let mut seq = Sequence::new();
        let writer_cache = cache.clone();
        // First read snapshots an empty page, then a write lands before it returns.
        repo.expect_list_content()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |id| {
                writer_cache.invalidate_event(id);
                Ok(vec![])
            });
        let fresh = stored.clone();
        repo.expect_list_content()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(vec![fresh.clone()]));

        let handler = EventHandler::new(
            Arc::new(repo),
            Arc::new(MockObjectStorage::new()),
            cache,
            ChangeFeed::default(),
        );
        let id = event_id.to_string();

        assert!(handler.get_event_page(&id).await.unwrap().content.is_empty());
        let page = handler.get_event_page(&id).await.unwrap();
        assert_eq!(page.content, vec![stored]);
    }
}
