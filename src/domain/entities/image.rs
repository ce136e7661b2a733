use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{errors::new_validation_error, imaging::{CropRegion, DataUri}};

/// Crop rectangle as selected on the rendered image, in rendered pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CropRequest {
    #[validate(range(min = 0.0, message = "Crop x must not be negative"))]
    pub x: f64,

    #[validate(range(min = 0.0, message = "Crop y must not be negative"))]
    pub y: f64,

    #[validate(range(min = 1.0, message = "Crop width must be at least 1px"))]
    pub width: f64,

    #[validate(range(min = 1.0, message = "Crop height must be at least 1px"))]
    pub height: f64,

    #[validate(range(min = 1.0, message = "Displayed width must be at least 1px"))]
    pub display_width: f64,

    #[validate(range(min = 1.0, message = "Displayed height must be at least 1px"))]
    pub display_height: f64,
}

impl From<CropRequest> for CropRegion {
    fn from(crop: CropRequest) -> Self {
        CropRegion {
            x: crop.x,
            y: crop.y,
            width: crop.width,
            height: crop.height,
            display_width: crop.display_width,
            display_height: crop.display_height,
        }
    }
}

/// An image payload as sent by the browser: a base64 data URI plus the optional crop.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageUpload {
    #[validate(custom(function = "validate_image_data_uri"))]
    pub image: String,

    #[validate(nested)]
    pub crop: Option<CropRequest>,
}

impl ImageUpload {
    pub fn crop_region(&self) -> Option<CropRegion> {
        self.crop.map(CropRegion::from)
    }
}

pub fn validate_image_data_uri(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(new_validation_error("image_missing", "An image is required"));
    }
    match DataUri::parse(value) {
        Ok(uri) if uri.mime_type.starts_with("image/") => Ok(()),
        Ok(_) => Err(new_validation_error("image_mime", "Payload must be an image data URI")),
        Err(_) => Err(new_validation_error("image_encoding", "Image must be a base64 data URI")),
    }
}
