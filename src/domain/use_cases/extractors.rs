use actix_web::{FromRequest, HttpRequest, HttpMessage};
use chrono::{DateTime, TimeZone, Utc};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::{entities::session::SessionClaims, errors::AuthError};

/// The verified session behind a request.
/// Returns 401 if the request did not pass the session middleware.
/// Usage: Add `session: SessionContext` as a parameter to your handler function.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl From<&SessionClaims> for SessionContext {
    fn from(claims: &SessionClaims) -> Self {
        SessionContext {
            session_id: claims.sid,
            expires_at: Utc
                .timestamp_opt(claims.exp as i64, 0)
                .single()
                .unwrap_or_else(Utc::now),
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<SessionClaims>() {
            Some(claims) => ready(Ok(SessionContext::from(claims))),
            None => ready(Err(AuthError::MissingCredentials.into())),
        }
    }
}
