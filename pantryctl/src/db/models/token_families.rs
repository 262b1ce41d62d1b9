//! Database models for refresh-token families.

use crate::types::{RefreshTokenId, TokenFamilyId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Why a token family stopped being usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    Logout,
    LogoutAll,
    SessionLimit,
    ReuseDetected,
}

impl RevocationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Logout => "logout",
            RevocationReason::LogoutAll => "logout_all",
            RevocationReason::SessionLimit => "session_limit",
            RevocationReason::ReuseDetected => "reuse_detected",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TokenFamilyDBResponse {
    pub id: TokenFamilyId,
    pub user_id: UserId,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_reason: Option<String>,
}

impl TokenFamilyDBResponse {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenDBResponse {
    pub id: RefreshTokenId,
    pub family_id: TokenFamilyId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
