use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SessionRequest {
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionResponse {
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        SessionResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }
}

/// Claims carried by a diary session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionClaims {
    pub sid: Uuid,
    pub exp: usize,
    pub iat: usize,
}
