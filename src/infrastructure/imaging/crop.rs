use image::{codecs::jpeg::JpegEncoder, imageops::FilterType};

use super::{DataUri, ImageError};

/// Longest side allowed after cropping.
pub const MAX_IMAGE_DIMENSION: u32 = 1920;
pub const JPEG_QUALITY: u8 = 90;

/// Rectangle selected on the rendered image. Coordinates are in rendered pixels;
/// `display_*` is the rendered size the rectangle was drawn against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub display_width: f64,
    pub display_height: f64,
}

impl CropRegion {
    /// Whole image, used when the user skips cropping.
    pub fn full(width: u32, height: u32) -> Self {
        CropRegion {
            x: 0.0,
            y: 0.0,
            width: width as f64,
            height: height as f64,
            display_width: width as f64,
            display_height: height as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CroppedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CroppedImage {
    pub const MIME_TYPE: &'static str = "image/jpeg";

    pub fn to_data_uri(&self) -> String {
        DataUri::encode(Self::MIME_TYPE, &self.bytes)
    }
}

/// Proportionally shrinks `width x height` so the longer side is at most `max`.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    if width > height {
        let ratio = max as f64 / width as f64;
        (max, ((height as f64 * ratio).floor() as u32).max(1))
    } else {
        let ratio = max as f64 / height as f64;
        (((width as f64 * ratio).floor() as u32).max(1), max)
    }
}

/// Crops `source` to `region` (the whole image when `None`), bounds it to
/// [`MAX_IMAGE_DIMENSION`] and re-encodes it as JPEG.
pub fn crop_and_resize(source: &[u8], region: Option<CropRegion>) -> Result<CroppedImage, ImageError> {
    if !infer::is_image(source) {
        let detected = infer::get(source)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        return Err(ImageError::Unsupported(detected));
    }

    let img = image::load_from_memory(source).map_err(|e| ImageError::Decode(e.to_string()))?;
    let (natural_width, natural_height) = (img.width(), img.height());
    let region = region.unwrap_or_else(|| CropRegion::full(natural_width, natural_height));

    if region.display_width <= 0.0 || region.display_height <= 0.0 {
        return Err(ImageError::EmptyRegion);
    }

    let scale_x = natural_width as f64 / region.display_width;
    let scale_y = natural_height as f64 / region.display_height;

    let src_x = (region.x * scale_x).floor().max(0.0) as u32;
    let src_y = (region.y * scale_y).floor().max(0.0) as u32;
    if src_x >= natural_width || src_y >= natural_height {
        return Err(ImageError::EmptyRegion);
    }

    let src_width = ((region.width * scale_x).floor().max(0.0) as u32).min(natural_width - src_x);
    let src_height = ((region.height * scale_y).floor().max(0.0) as u32).min(natural_height - src_y);
    if src_width == 0 || src_height == 0 {
        return Err(ImageError::EmptyRegion);
    }

    let (target_width, target_height) = fit_within(src_width, src_height, MAX_IMAGE_DIMENSION);

    let mut output = img.crop_imm(src_x, src_y, src_width, src_height);
    if (target_width, target_height) != (src_width, src_height) {
        output = output.resize_exact(target_width, target_height, FilterType::Lanczos3);
    }

    let rgb = output.to_rgb8();
    let mut bytes = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY))
        .map_err(|e| ImageError::Encode(e.to_string()))?;

    if bytes.is_empty() {
        return Err(ImageError::EmptyOutput);
    }

    tracing::debug!(
        source = %format!("{}x{}", natural_width, natural_height),
        output = %format!("{}x{}", target_width, target_height),
        size = bytes.len(),
        "Image cropped"
    );

    Ok(CroppedImage {
        bytes,
        width: target_width,
        height: target_height,
    })
}
