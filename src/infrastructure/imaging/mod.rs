use derive_more::Display;

mod crop;
mod data_uri;

pub use crop::{crop_and_resize, fit_within, CropRegion, CroppedImage, JPEG_QUALITY, MAX_IMAGE_DIMENSION};
pub use data_uri::DataUri;

#[derive(Debug, Display, PartialEq)]
pub enum ImageError {
    #[display("invalid data URI: {_0}")]
    InvalidDataUri(String),

    #[display("unsupported payload: {_0}")]
    Unsupported(String),

    #[display("could not decode image: {_0}")]
    Decode(String),

    #[display("crop region is empty or outside the image")]
    EmptyRegion,

    #[display("could not encode image: {_0}")]
    Encode(String),

    #[display("encoder produced no data")]
    EmptyOutput,
}

impl std::error::Error for ImageError {}
