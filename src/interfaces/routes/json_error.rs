use actix_web::{
    web,
    http::StatusCode,
    ResponseError,
    HttpResponse,
    error::JsonPayloadError,
};
use serde_json::json;


/// Largest request carries a four-image gallery.
const MAX_IMAGES_PER_REQUEST: usize = 4;
const JSON_OVERHEAD_BYTES: usize = 64 * 1024;

/// JSON extractor settings: body limit sized for base64 image payloads,
/// and extraction failures rendered as `{"error": ...}`.
pub fn json_config(max_upload_bytes: usize) -> web::JsonConfig {
    let base64_len = max_upload_bytes.div_ceil(3) * 4;
    let limit = base64_len
        .saturating_mul(MAX_IMAGES_PER_REQUEST)
        .saturating_add(JSON_OVERHEAD_BYTES);

    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| JsonError::from(err).into())
}

#[derive(Debug)]
pub struct JsonError {
    message: String,
    status: StatusCode
}

// Implement Display for JsonError
impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}
impl From<serde_json::Error> for JsonError {
    fn from(err: serde_json::Error) -> Self {
        JsonError {
            message: format!("JSON error: {}", err),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonPayloadError> for JsonError {
    fn from(err: JsonPayloadError) -> Self {
        let status = match &err {
            JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        JsonError {
            message: format!("JSON payload error: {}", err),
            status,
        }
    }
}
