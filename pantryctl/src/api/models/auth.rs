//! API request/response models for login sessions.

use crate::api::models::users::UserResponse;
use crate::db::models::token_families::TokenFamilyDBResponse;
use crate::types::TokenFamilyId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Login credentials. `login` accepts either the email address or the username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access/refresh token pair handed out by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub revoked: u64,
}

/// An active login session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: TokenFamilyId,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    /// Whether this is the session the request was made with
    pub current: bool,
}

impl SessionResponse {
    pub fn new(family: TokenFamilyDBResponse, current_session: TokenFamilyId) -> Self {
        Self {
            id: family.id,
            user_agent: family.user_agent,
            created_at: family.created_at,
            last_used_at: family.last_used_at,
            current: family.id == current_session,
        }
    }
}
