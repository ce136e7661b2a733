use actix_web::{web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::event::SuggestTitleRequest,
    errors::AppError,
    use_cases::extractors::SessionContext,
    utils::get_client_ip::get_client_ip,
    AppState,
};

fn check_ai_quota(req: &HttpRequest, state: &AppState) -> Result<(), AppError> {
    let client_ip = get_client_ip(req, state.trust_forwarded_for);
    state
        .rate_limiter
        .check(&format!("ai:{}", client_ip))
        .map_err(|retry_after| {
            tracing::warn!(%client_ip, retry_after, "AI requests rate limited");
            AppError::RateLimited(retry_after)
        })
}

#[instrument(skip(req, _session, state, data))]
pub async fn suggest_title(
    req: HttpRequest,
    _session: SessionContext,
    state: web::Data<AppState>,
    data: web::Json<SuggestTitleRequest>,
) -> Result<impl Responder, AppError> {
    check_ai_quota(&req, &state)?;
    let response = state.ai_handler.suggest_title(data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(req, _session, state))]
pub async fn generate_video(
    req: HttpRequest,
    _session: SessionContext,
    state: web::Data<AppState>,
    event_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    check_ai_quota(&req, &state)?;
    let response = state.ai_handler.generate_video(&event_id).await?;
    Ok(HttpResponse::Ok().json(response))
}
