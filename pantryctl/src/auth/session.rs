//! JWT access token creation and verification.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    api::models::users::{CurrentUser, Role},
    config::Config,
    errors::Error,
    types::{TokenFamilyId, UserId},
};

/// Access token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,
    pub email: String,
    pub username: String,
    pub role: Role,
    /// Token family (login session) the token belongs to
    pub sid: TokenFamilyId,
    pub exp: i64,
    pub iat: i64,
}

impl AccessClaims {
    pub fn new(user: &CurrentUser, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.access_token_expiry;

        Self {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            role: user.role,
            sid: user.session_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

impl From<AccessClaims> for CurrentUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            username: claims.username,
            role: claims.role,
            session_id: claims.sid,
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT access tokens: secret_key is required".to_string(),
    })
}

/// Create a signed access token for a user session
pub fn create_access_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    let claims = AccessClaims::new(user, config);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode an access token
pub fn verify_access_token(token: &str, config: &Config) -> Result<CurrentUser, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<AccessClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => Error::TokenExpired,

        // Client errors (401) - malformed tokens, bad signatures, invalid claims
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithm => Error::InvalidToken { message: e.to_string() },

        // Server errors (500) - key issues, internal failures
        ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::RsaFailedSigning
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::MissingAlgorithm
        | ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    Ok(CurrentUser::from(token_data.claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;
    use uuid::Uuid;

    fn create_test_user() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            role: Role::Staff,
            session_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_create_and_verify_access_token() {
        let config = create_test_config();
        let user = create_test_user();

        let token = create_access_token(&user, &config).unwrap();
        assert!(!token.is_empty());

        let verified = verify_access_token(&token, &config).unwrap();
        assert_eq!(verified.id, user.id);
        assert_eq!(verified.email, user.email);
        assert_eq!(verified.username, user.username);
        assert_eq!(verified.role, Role::Staff);
        assert_eq!(verified.session_id, user.session_id);
    }

    #[test]
    fn test_wrong_secret_is_invalid_token() {
        let mut config = create_test_config();
        let token = create_access_token(&create_test_user(), &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let err = verify_access_token(&token, &config).unwrap_err();
        assert!(matches!(err, Error::InvalidToken { .. }));
    }

    #[test]
    fn test_expired_token() {
        let config = create_test_config();
        let user = create_test_user();

        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            role: user.role,
            sid: user.session_id,
            exp: (now - chrono::Duration::seconds(3600)).timestamp(),
            iat: (now - chrono::Duration::seconds(7200)).timestamp(),
        };
        let key = EncodingKey::from_secret(config.secret_key.as_deref().unwrap().as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let err = verify_access_token(&token, &config).unwrap_err();
        assert!(matches!(err, Error::TokenExpired));
    }

    #[test]
    fn test_malformed_tokens() {
        let config = create_test_config();

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            let err = verify_access_token(token, &config).unwrap_err();
            assert!(matches!(err, Error::InvalidToken { .. }), "Expected InvalidToken for token: {token}");
        }
    }
}
