use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{errors::AuthError, AppState};

const API_PREFIX: &str = "/api/v1/";
/// Browsers cannot attach headers to an `EventSource`, so the change stream
/// also accepts the token as a query parameter.
const STREAM_PATH: &str = "/api/v1/changes";
const STREAM_TOKEN_PARAM: &str = "access_token";

/// Requires a valid session token on every API route except session creation.
pub struct SessionMiddleware;

impl<S> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_public_route(req.path(), req.method().as_str()) {
                return service.call(req).await;
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                tracing::error!("AppState missing in session middleware");
                return Ok(reject(req, AuthError::MissingSessionService));
            };

            let Some(token) = extract_token(&req) else {
                tracing::warn!(path = req.path(), "Missing or malformed Authorization header");
                return Ok(reject(req, AuthError::MissingCredentials));
            };

            match state.session_handler.verify_session(&token) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                }
                Err(e) => {
                    tracing::warn!(path = req.path(), "Rejected session token: {}", e);
                    Ok(reject(req, e))
                }
            }
        })
    }
}

fn is_public_route(path: &str, method: &str) -> bool {
    if method == "OPTIONS" {
        return true;
    }
    if !path.starts_with(API_PREFIX) {
        return true;
    }

    matches!((path, method), ("/api/v1/session", "POST"))
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split_whitespace().collect();
            if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
                Some(parts[1].to_string())
            } else {
                None
            }
        });

    from_header.or_else(|| {
        if req.path() != STREAM_PATH {
            return None;
        }
        url::form_urlencoded::parse(req.query_string().as_bytes())
            .find(|(key, _)| key == STREAM_TOKEN_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    })
}

fn reject(req: ServiceRequest, error: AuthError) -> ServiceResponse<BoxBody> {
    req.into_response(error.error_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_api_routes_are_gated() {
        assert!(is_public_route("/", "GET"));
        assert!(is_public_route("/health", "GET"));
        assert!(is_public_route("/media/events/1_a.jpg", "GET"));
        assert!(is_public_route("/api/v1/session", "POST"));
        assert!(is_public_route("/api/v1/events", "OPTIONS"));

        assert!(!is_public_route("/api/v1/events", "GET"));
        assert!(!is_public_route("/api/v1/session", "GET"));
        assert!(!is_public_route("/api/v1/ai/title", "POST"));
    }
}
