use validator::Validate;

use crate::auth::password::verify_password;
use crate::entities::session::{SessionClaims, SessionRequest, SessionResponse};
use crate::errors::AuthError;
use crate::repositories::token::SessionTokenRepository;

/// Gate in front of the diary: one shared password, many short-lived sessions.
pub struct SessionHandler<T>
where
    T: SessionTokenRepository,
{
    pub token_service: T,
    password_hash: String,
}

impl<T> SessionHandler<T>
where
    T: SessionTokenRepository,
{
    pub fn new(token_service: T, password_hash: String) -> Self {
        SessionHandler {
            token_service,
            password_hash,
        }
    }

    /// Opens a session when `request.password` matches the configured hash.
    pub fn create_session(&self, request: SessionRequest) -> Result<SessionResponse, AuthError> {
        request.validate()?;

        let is_password_valid = verify_password(&request.password, &self.password_hash).map_err(|e| {
            tracing::error!("Password verification failed: {}", e);
            AuthError::from(e)
        })?;
        if !is_password_valid {
            tracing::warn!("Rejected session request with wrong password");
            return Err(AuthError::WrongPassword);
        }

        let (token, expires_at) = self.token_service.issue()?;
        tracing::info!(%expires_at, "Session opened");
        Ok(SessionResponse::new(token, expires_at))
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.token_service.verify(token)
    }
}
