use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use uuid::Uuid;

use crate::entities::session::SessionClaims;
use crate::errors::AuthError;
use crate::repositories::token::SessionTokenRepository;
use crate::settings::{AppConfig, SessionKeys};

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Clone)]
pub struct SessionTokenService {
    keys: SessionKeys,
    ttl: Duration,
}

impl SessionTokenService {
    pub fn new(config: &AppConfig) -> Self {
        SessionTokenService {
            keys: SessionKeys::from(config),
            ttl: Duration::minutes(config.session_ttl_minutes),
        }
    }

    pub fn create_session_jwt(&self, now: DateTime<Utc>) -> Result<(String, DateTime<Utc>), AuthError> {
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sid: Uuid::new_v4(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding).map_err(|e| {
            tracing::warn!("Failed to sign session token: {}", e);
            AuthError::TokenCreation
        })?;
        Ok((token, expires_at))
    }

    pub fn decode_session_jwt(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<SessionClaims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(AuthError::from)
    }
}

impl SessionTokenRepository for SessionTokenService {
    fn issue(&self) -> Result<(String, DateTime<Utc>), AuthError> {
        self.create_session_jwt(Utc::now())
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.decode_session_jwt(token)
    }
}
