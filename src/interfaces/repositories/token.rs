use chrono::{DateTime, Utc};

use crate::{entities::session::SessionClaims, errors::AuthError};

#[cfg_attr(test, mockall::automock)]
pub trait SessionTokenRepository: Send + Sync {
    /// Signs a fresh session token, returning it with its expiry.
    fn issue(&self) -> Result<(String, DateTime<Utc>), AuthError>;

    /// Verifies signature and expiry of a session token.
    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError>;
}
