use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    entities::{content::ContentBlock, image::ImageUpload},
    errors::new_validation_error,
};

// ───── Constants ──────────────────────────────────────────────────────
const MAX_TITLE_LENGTH: u64 = 100;
const MIN_DESCRIPTION_LENGTH: u64 = 10;
const MAX_DESCRIPTION_LENGTH: u64 = 5000;

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// One diary entry. `created_at` is the date of the memory, fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventInsert {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

// ───── API Models ───────────────────────────────────────────────────

/// Event plus its timeline, content sorted by creation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub event: Event,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewEventRequest {
    #[validate(
        length(max = MAX_TITLE_LENGTH, message = "Title must be at most 100 characters"),
        custom(function = "validate_not_blank", message = "Title is required")
    )]
    pub title: String,

    #[validate(length(
        min = MIN_DESCRIPTION_LENGTH,
        max = MAX_DESCRIPTION_LENGTH,
        message = "Description must be between 10 and 5000 characters"
    ))]
    pub description: String,

    #[serde(flatten)]
    #[validate(nested)]
    pub upload: ImageUpload,

    #[validate(required(message = "A date is required"))]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SuggestTitleRequest {
    #[validate(custom(function = "validate_not_blank", message = "Description is required"))]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SuggestTitleResponse {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub video_url: String,
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(new_validation_error("blank", "Value cannot be blank"));
    }
    Ok(())
}

// ───── Conversions ──────────────────────────────────────────────────

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            image_path: row.image_path,
            created_at: row.created_at,
            width: row.width.and_then(|w| u32::try_from(w).ok()),
            height: row.height.and_then(|h| u32::try_from(h).ok()),
        }
    }
}

impl EventPage {
    pub fn new(event: Event, mut content: Vec<ContentBlock>) -> Self {
        content.sort_by_key(|block| block.created_at);
        EventPage { event, content }
    }
}
