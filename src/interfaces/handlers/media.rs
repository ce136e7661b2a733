use actix_web::{http::header, web, HttpResponse, Responder};
use tracing::instrument;

use crate::{errors::AppError, AppState};

/// Objects are written once under unique keys, so clients may cache them for good.
const MEDIA_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[instrument(skip(state))]
pub async fn get_media(
    state: web::Data<AppState>,
    key: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let bytes = state.storage.get(&key).await?;
    let content_type = mime_guess::from_path(key.as_str()).first_or_octet_stream();

    Ok(HttpResponse::Ok()
        .content_type(content_type.as_ref())
        .insert_header((header::CACHE_CONTROL, MEDIA_CACHE_CONTROL))
        .body(bytes))
}
