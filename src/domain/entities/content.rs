use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{entities::image::ImageUpload, errors::new_validation_error};

// ───── Constants ──────────────────────────────────────────────────────
pub const MIN_TEXT_LENGTH: usize = 5;
const MAX_TEXT_LENGTH: u64 = 10_000;
pub const MIN_GALLERY_IMAGES: u64 = 2;
pub const MAX_GALLERY_IMAGES: u64 = 4;

// ───── Domain Models ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePosition {
    #[default]
    Left,
    Right,
}

/// One image inside a gallery block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub value: String,
    pub image_path: String,
    pub width: u32,
    pub height: u32,
}

/// Variant payload of a content block, tagged by `type` on the wire and in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ContentBody {
    Text {
        value: String,
    },
    Image {
        value: String,
        image_path: String,
        width: u32,
        height: u32,
    },
    Gallery {
        images: Vec<GalleryImage>,
    },
    ImageText {
        image_url: String,
        image_path: String,
        width: u32,
        height: u32,
        text: String,
        image_position: ImagePosition,
    },
}

impl ContentBody {
    pub fn kind(&self) -> &'static str {
        match self {
            ContentBody::Text { .. } => "text",
            ContentBody::Image { .. } => "image",
            ContentBody::Gallery { .. } => "gallery",
            ContentBody::ImageText { .. } => "imageText",
        }
    }

    /// Object storage keys backing this block.
    pub fn image_paths(&self) -> Vec<&str> {
        match self {
            ContentBody::Text { .. } => Vec::new(),
            ContentBody::Image { image_path, .. } => vec![image_path.as_str()],
            ContentBody::Gallery { images } => images.iter().map(|img| img.image_path.as_str()).collect(),
            ContentBody::ImageText { image_path, .. } => vec![image_path.as_str()],
        }
    }

    /// Free text carried by the block, used as narration notes.
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentBody::Text { value } => Some(value),
            ContentBody::ImageText { text, .. } => Some(text),
            ContentBody::Image { .. } | ContentBody::Gallery { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub id: Uuid,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: ContentBody,
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct ContentRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub kind: String,
    pub body: Json<ContentBody>,
    pub created_at: DateTime<Utc>,
}

impl From<ContentRow> for ContentBlock {
    fn from(row: ContentRow) -> Self {
        ContentBlock {
            id: row.id,
            event_id: row.event_id,
            created_at: row.created_at,
            body: row.body.0,
        }
    }
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(default)]
pub struct NewTextContent {
    #[validate(
        length(max = MAX_TEXT_LENGTH, message = "Text is too long"),
        custom(function = "validate_block_text")
    )]
    pub text: String,
}

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(default)]
pub struct NewImageContent {
    #[serde(flatten)]
    #[validate(nested)]
    pub upload: ImageUpload,
}

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(default)]
pub struct NewGalleryContent {
    #[validate(
        length(
            min = MIN_GALLERY_IMAGES,
            max = MAX_GALLERY_IMAGES,
            message = "A gallery needs between 2 and 4 images"
        ),
        nested
    )]
    pub images: Vec<ImageUpload>,
}

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewImageTextContent {
    #[serde(flatten)]
    #[validate(nested)]
    pub upload: ImageUpload,

    #[validate(
        length(max = MAX_TEXT_LENGTH, message = "Text is too long"),
        custom(function = "validate_block_text")
    )]
    pub text: String,

    pub image_position: ImagePosition,
}

/// Any of the four block submissions.
#[derive(Debug)]
pub enum ContentDraft {
    Text(NewTextContent),
    Image(NewImageContent),
    Gallery(NewGalleryContent),
    ImageText(NewImageTextContent),
}

impl ContentDraft {
    /// Placeholder body shown before the server has stored anything.
    /// Images point at the submitted data URI and have no storage path yet.
    pub fn preview(&self) -> ContentBody {
        match self {
            ContentDraft::Text(draft) => ContentBody::Text {
                value: draft.text.trim().to_string(),
            },
            ContentDraft::Image(draft) => ContentBody::Image {
                value: draft.upload.image.clone(),
                image_path: String::new(),
                width: 0,
                height: 0,
            },
            ContentDraft::Gallery(draft) => ContentBody::Gallery {
                images: draft
                    .images
                    .iter()
                    .map(|upload| GalleryImage {
                        value: upload.image.clone(),
                        image_path: String::new(),
                        width: 0,
                        height: 0,
                    })
                    .collect(),
            },
            ContentDraft::ImageText(draft) => ContentBody::ImageText {
                image_url: draft.upload.image.clone(),
                image_path: String::new(),
                width: 0,
                height: 0,
                text: draft.text.trim().to_string(),
                image_position: draft.image_position,
            },
        }
    }
}

pub fn validate_block_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().chars().count() < MIN_TEXT_LENGTH {
        return Err(new_validation_error("text_too_short", "Text is too short, write at least 5 characters"));
    }
    Ok(())
}
