use actix_web::{web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::session::SessionRequest,
    errors::AuthError,
    utils::get_client_ip::get_client_ip,
    AppState,
};

#[instrument(skip(req, state, data))]
pub async fn create_session(
    req: HttpRequest,
    state: web::Data<AppState>,
    data: web::Json<SessionRequest>,
) -> Result<impl Responder, AuthError> {
    let client_ip = get_client_ip(&req, state.trust_forwarded_for);
    state
        .rate_limiter
        .check(&format!("session:{}", client_ip))
        .map_err(|retry_after| {
            tracing::warn!(%client_ip, retry_after, "Session attempts rate limited");
            AuthError::RateLimited(retry_after)
        })?;

    let response = state.session_handler.create_session(data.into_inner())?;
    Ok(HttpResponse::Created().json(response))
}
