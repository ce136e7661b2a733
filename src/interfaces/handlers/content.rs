use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::content::{NewGalleryContent, NewImageContent, NewImageTextContent, NewTextContent},
    errors::AppError,
    use_cases::extractors::SessionContext,
    AppState,
};

#[instrument(skip(_session, state))]
pub async fn list_content(
    _session: SessionContext,
    state: web::Data<AppState>,
    event_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let content = state.content_handler.list_content(&event_id).await?;
    Ok(HttpResponse::Ok().json(content))
}

#[instrument(skip(_session, state, data))]
pub async fn add_text(
    _session: SessionContext,
    state: web::Data<AppState>,
    event_id: web::Path<String>,
    data: web::Json<NewTextContent>,
) -> Result<impl Responder, AppError> {
    let block = state.content_handler.add_text(&event_id, data.into_inner()).await?;
    Ok(HttpResponse::Created().json(block))
}

#[instrument(skip(_session, state, data))]
pub async fn add_image(
    _session: SessionContext,
    state: web::Data<AppState>,
    event_id: web::Path<String>,
    data: web::Json<NewImageContent>,
) -> Result<impl Responder, AppError> {
    let block = state.content_handler.add_image(&event_id, data.into_inner()).await?;
    Ok(HttpResponse::Created().json(block))
}

#[instrument(skip(_session, state, data))]
pub async fn add_gallery(
    _session: SessionContext,
    state: web::Data<AppState>,
    event_id: web::Path<String>,
    data: web::Json<NewGalleryContent>,
) -> Result<impl Responder, AppError> {
    let block = state.content_handler.add_gallery(&event_id, data.into_inner()).await?;
    Ok(HttpResponse::Created().json(block))
}

#[instrument(skip(_session, state, data))]
pub async fn add_image_text(
    _session: SessionContext,
    state: web::Data<AppState>,
    event_id: web::Path<String>,
    data: web::Json<NewImageTextContent>,
) -> Result<impl Responder, AppError> {
    let block = state.content_handler.add_image_text(&event_id, data.into_inner()).await?;
    Ok(HttpResponse::Created().json(block))
}

#[instrument(skip(_session, state))]
pub async fn delete_content(
    _session: SessionContext,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<impl Responder, AppError> {
    let (event_id, content_id) = path.into_inner();
    state.content_handler.delete_content(&event_id, &content_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
