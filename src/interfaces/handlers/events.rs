use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::event::NewEventRequest,
    errors::AppError,
    use_cases::extractors::SessionContext,
    AppState,
};

#[instrument(skip(_session, state))]
pub async fn list_events(
    _session: SessionContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let events = state.event_handler.list_events().await?;
    Ok(HttpResponse::Ok().json(&*events))
}

#[instrument(skip(_session, state, data), fields(title = %data.title))]
pub async fn create_event(
    _session: SessionContext,
    state: web::Data<AppState>,
    data: web::Json<NewEventRequest>,
) -> Result<impl Responder, AppError> {
    let event = state.event_handler.create_event(data.into_inner()).await?;
    Ok(HttpResponse::Created().json(event))
}

#[instrument(skip(_session, state))]
pub async fn get_event_page(
    _session: SessionContext,
    state: web::Data<AppState>,
    event_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let page = state.event_handler.get_event_page(&event_id).await?;
    Ok(HttpResponse::Ok().json(&*page))
}

#[instrument(skip(_session, state))]
pub async fn delete_event(
    _session: SessionContext,
    state: web::Data<AppState>,
    event_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    state.event_handler.delete_event(&event_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
