use std::sync::Arc;

use validator::Validate;

use crate::{
    ai::{AiService, VideoRequest},
    entities::event::{SuggestTitleRequest, SuggestTitleResponse, VideoResponse},
    errors::AppError,
    repositories::event::EventRepository,
    storage::ObjectStorage,
    utils::valid_uuid::valid_uuid,
};

pub struct AiHandler {
    pub ai_service: Arc<dyn AiService>,
    pub event_repo: Arc<dyn EventRepository>,
    pub storage: Arc<dyn ObjectStorage>,
}

impl AiHandler {
    pub fn new(
        ai_service: Arc<dyn AiService>,
        event_repo: Arc<dyn EventRepository>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        AiHandler {
            ai_service,
            event_repo,
            storage,
        }
    }

    /// Suggests a title for the description; the service's failure message is returned unchanged.
    pub async fn suggest_title(&self, request: SuggestTitleRequest) -> Result<SuggestTitleResponse, AppError> {
        request.validate()?;

        let title = self
            .ai_service
            .suggest_title(request.description.trim())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Title suggestion failed");
                AppError::from(e)
            })?;

        Ok(SuggestTitleResponse { title })
    }

    /// Narrated video of an event, returned as a `data:` URI.
    pub async fn generate_video(&self, event_id: &str) -> Result<VideoResponse, AppError> {
        let event_id = valid_uuid(event_id)?;
        let event = self
            .event_repo
            .get_event(&event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

        let mut content = self.event_repo.list_content(&event_id).await?;
        content.sort_by_key(|block| block.created_at);
        let notes = content
            .iter()
            .filter_map(|block| block.body.text())
            .map(str::to_string)
            .collect();

        let cover_image = self.storage.get(&event.image_path).await?;
        let cover_mime_type = mime_guess::from_path(&event.image_path)
            .first_raw()
            .unwrap_or("image/jpeg")
            .to_string();

        let request = VideoRequest {
            title: event.title,
            description: event.description,
            cover_image,
            cover_mime_type,
            notes,
        };

        tracing::info!(%event_id, "Generating event video");
        let video = self.ai_service.generate_video(request).await.map_err(|e| {
            tracing::error!(%event_id, error = %e, "Video generation failed");
            AppError::from(e)
        })?;

        Ok(VideoResponse {
            video_url: video.to_data_uri(),
        })
    }
}
