//! Login sessions backed by rotating refresh-token families.
//!
//! A refresh token travels as `<token id>.<secret>`. Only a SHA-256 digest of
//! the secret is stored. Every refresh marks the presented token used and
//! issues its successor in the same family; presenting a used token again
//! revokes the family.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};

use crate::{
    api::models::{
        auth::{LoginRequest, SessionResponse, TokenResponse},
        users::{CurrentUser, UserResponse},
    },
    auth::{password, session},
    config::Config,
    db::{
        handlers::{Repository, TokenFamilies, Users},
        models::{token_families::RevocationReason, users::UserDBResponse},
    },
    errors::{Error, Result},
    types::{RefreshTokenId, TokenFamilyId, abbrev_uuid},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

fn unauthenticated(message: &str) -> Error {
    Error::Unauthenticated {
        message: Some(message.to_string()),
    }
}

/// Split a refresh token into its id and secret.
pub fn parse_refresh_token(token: &str) -> Option<(RefreshTokenId, &str)> {
    let (id, secret) = token.split_once('.')?;
    let id = id.parse().ok()?;
    (!secret.is_empty()).then_some((id, secret))
}

/// Issue the next refresh token of a family and return its wire form.
async fn issue_refresh_token(conn: &mut PgConnection, family_id: TokenFamilyId, config: &Config) -> Result<String> {
    let secret = password::generate_refresh_secret();
    let expires_at = Utc::now() + config.auth.refresh_token_expiry;
    let token = TokenFamilies::new(conn)
        .insert_token(family_id, &password::hash_refresh_secret(&secret), expires_at)
        .await?;
    Ok(format!("{}.{}", token.id, secret))
}

fn token_response(user: UserDBResponse, family_id: TokenFamilyId, refresh_token: String, config: &Config) -> Result<TokenResponse> {
    let current_user = CurrentUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        session_id: family_id,
    };
    let access_token = session::create_access_token(&current_user, config)?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: config.auth.access_token_expiry.as_secs() as i64,
        user: UserResponse::from(user),
    })
}

/// Authenticate with email or username and open a new session.
#[instrument(skip_all, err)]
pub async fn login(db: &PgPool, config: &Config, request: &LoginRequest, user_agent: Option<&str>) -> Result<TokenResponse> {
    let user = {
        let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Users::new(&mut conn).get_user_by_login(&request.login).await?
    };
    let user = user.ok_or_else(|| unauthenticated(INVALID_CREDENTIALS))?;

    if !password::verify_password(request.password.clone(), user.password_hash.clone()).await? {
        return Err(unauthenticated(INVALID_CREDENTIALS));
    }
    if !user.is_active {
        return Err(unauthenticated("Account is disabled"));
    }

    let mut tx = db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let keep = i64::from(config.auth.max_sessions) - 1;
    let evicted = TokenFamilies::new(&mut tx).revoke_beyond(user.id, keep).await?;
    if evicted > 0 {
        info!(user_id = %abbrev_uuid(&user.id), evicted, "Session limit reached, revoked oldest sessions");
    }

    let family = TokenFamilies::new(&mut tx).create_family(user.id, user_agent).await?;
    let refresh_token = issue_refresh_token(&mut tx, family.id, config).await?;
    Users::new(&mut tx).record_login(user.id).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(user_id = %abbrev_uuid(&user.id), session_id = %abbrev_uuid(&family.id), "User logged in");
    token_response(user, family.id, refresh_token, config)
}

/// Rotate a refresh token, returning a fresh access/refresh pair.
#[instrument(skip_all, err)]
pub async fn refresh(db: &PgPool, config: &Config, refresh_token: &str) -> Result<TokenResponse> {
    let (token_id, secret) = parse_refresh_token(refresh_token).ok_or_else(|| unauthenticated(INVALID_REFRESH_TOKEN))?;

    let mut tx = db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut families = TokenFamilies::new(&mut tx);

    let token = families
        .get_token(token_id)
        .await?
        .filter(|token| password::verify_refresh_secret(secret, &token.token_hash))
        .ok_or_else(|| unauthenticated(INVALID_REFRESH_TOKEN))?;

    let family = families
        .get_family(token.family_id)
        .await?
        .ok_or_else(|| unauthenticated(INVALID_REFRESH_TOKEN))?;
    if family.is_revoked() {
        return Err(unauthenticated("Session has been revoked"));
    }
    if token.expires_at <= Utc::now() {
        return Err(Error::TokenExpired);
    }

    if families.mark_used(token.id).await?.is_none() {
        warn!(
            session_id = %abbrev_uuid(&family.id),
            user_id = %abbrev_uuid(&family.user_id),
            "Refresh token reuse detected, revoking session"
        );
        families.revoke_family(family.id, RevocationReason::ReuseDetected).await?;
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        return Err(unauthenticated("Refresh token has already been used"));
    }

    let user = Users::new(&mut tx)
        .get_by_id(family.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| unauthenticated(INVALID_REFRESH_TOKEN))?;

    let next_token = issue_refresh_token(&mut tx, family.id, config).await?;
    TokenFamilies::new(&mut tx).touch_family(family.id).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    token_response(user, family.id, next_token, config)
}

/// Revoke the session a refresh token belongs to. Revoking an already revoked session succeeds.
#[instrument(skip_all, err)]
pub async fn logout(db: &PgPool, refresh_token: &str) -> Result<u64> {
    let (token_id, secret) = parse_refresh_token(refresh_token).ok_or_else(|| unauthenticated(INVALID_REFRESH_TOKEN))?;

    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut families = TokenFamilies::new(&mut conn);

    let token = families
        .get_token(token_id)
        .await?
        .filter(|token| password::verify_refresh_secret(secret, &token.token_hash))
        .ok_or_else(|| unauthenticated(INVALID_REFRESH_TOKEN))?;

    let revoked = families.revoke_family(token.family_id, RevocationReason::Logout).await?;
    Ok(u64::from(revoked))
}

/// Revoke every active session of the user.
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&user.id)), err)]
pub async fn logout_all(db: &PgPool, user: &CurrentUser) -> Result<u64> {
    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let revoked = TokenFamilies::new(&mut conn)
        .revoke_all_for_user(user.id, RevocationReason::LogoutAll)
        .await?;
    info!(revoked, "Logged out of all sessions");
    Ok(revoked)
}

/// Active sessions of the user, newest first.
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&user.id)), err)]
pub async fn sessions(db: &PgPool, user: &CurrentUser) -> Result<Vec<SessionResponse>> {
    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let families = TokenFamilies::new(&mut conn).list_active(user.id).await?;
    Ok(families
        .into_iter()
        .map(|family| SessionResponse::new(family, user.session_id))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{TEST_PASSWORD, create_test_config, create_test_user};
    use uuid::Uuid;

    fn login_request(login: &str) -> LoginRequest {
        LoginRequest {
            login: login.to_string(),
            password: TEST_PASSWORD.to_string(),
        }
    }

    #[test]
    fn test_parse_refresh_token() {
        let id = Uuid::new_v4();
        assert_eq!(parse_refresh_token(&format!("{id}.secret")), Some((id, "secret")));
        assert_eq!(parse_refresh_token("no-dot"), None);
        assert_eq!(parse_refresh_token("not-a-uuid.secret"), None);
        assert_eq!(parse_refresh_token(&format!("{id}.")), None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_by_email_and_username(pool: PgPool) {
        let config = create_test_config();
        let user = create_test_user(&pool, Role::Staff).await;

        let by_email = login(&pool, &config, &login_request(&user.email), Some("curl")).await.unwrap();
        assert_eq!(by_email.token_type, "Bearer");
        assert_eq!(by_email.expires_in, config.auth.access_token_expiry.as_secs() as i64);
        assert_eq!(by_email.user.id, user.id);

        let by_username = login(&pool, &config, &login_request(&user.username), None).await.unwrap();
        let current = session::verify_access_token(&by_username.access_token, &config).unwrap();
        assert_eq!(current.role, Role::Staff);

        let mut conn = pool.acquire().await.unwrap();
        let stored = Users::new(&mut conn).get_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_rejects_bad_credentials(pool: PgPool) {
        let config = create_test_config();
        let user = create_test_user(&pool, Role::Viewer).await;

        let wrong = LoginRequest {
            login: user.email.clone(),
            password: "not-the-password".to_string(),
        };
        assert!(matches!(
            login(&pool, &config, &wrong, None).await,
            Err(Error::Unauthenticated { .. })
        ));
        assert!(matches!(
            login(&pool, &config, &login_request("nobody@example.com"), None).await,
            Err(Error::Unauthenticated { .. })
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_refresh_rotates_tokens(pool: PgPool) {
        let config = create_test_config();
        let user = create_test_user(&pool, Role::Manager).await;

        let first = login(&pool, &config, &login_request(&user.email), None).await.unwrap();
        let second = refresh(&pool, &config, &first.refresh_token).await.unwrap();

        assert_ne!(first.refresh_token, second.refresh_token);
        let first_session = session::verify_access_token(&first.access_token, &config).unwrap().session_id;
        let second_session = session::verify_access_token(&second.access_token, &config).unwrap().session_id;
        assert_eq!(first_session, second_session);

        let third = refresh(&pool, &config, &second.refresh_token).await;
        assert!(third.is_ok());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reuse_revokes_family(pool: PgPool) {
        let config = create_test_config();
        let user = create_test_user(&pool, Role::Manager).await;

        let first = login(&pool, &config, &login_request(&user.email), None).await.unwrap();
        let second = refresh(&pool, &config, &first.refresh_token).await.unwrap();

        // Replaying the first token is reuse
        let replay = refresh(&pool, &config, &first.refresh_token).await;
        assert!(matches!(replay, Err(Error::Unauthenticated { .. })));

        // The legitimate successor died with the family
        let successor = refresh(&pool, &config, &second.refresh_token).await;
        assert!(matches!(successor, Err(Error::Unauthenticated { .. })));

        let mut conn = pool.acquire().await.unwrap();
        let session_id = session::verify_access_token(&first.access_token, &config).unwrap().session_id;
        let family = TokenFamilies::new(&mut conn).get_family(session_id).await.unwrap().unwrap();
        assert_eq!(family.revoked_reason.as_deref(), Some("reuse_detected"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_tampered_secret_rejected(pool: PgPool) {
        let config = create_test_config();
        let user = create_test_user(&pool, Role::Viewer).await;
        let tokens = login(&pool, &config, &login_request(&user.email), None).await.unwrap();

        let (id, _) = parse_refresh_token(&tokens.refresh_token).unwrap();
        let forged = format!("{id}.{}", password::generate_refresh_secret());
        assert!(matches!(refresh(&pool, &config, &forged).await, Err(Error::Unauthenticated { .. })));

        // The real token is still good because the forgery never marked it used
        assert!(refresh(&pool, &config, &tokens.refresh_token).await.is_ok());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_expired_refresh_token(pool: PgPool) {
        let config = create_test_config();
        let user = create_test_user(&pool, Role::Viewer).await;
        let tokens = login(&pool, &config, &login_request(&user.email), None).await.unwrap();

        let (id, _) = parse_refresh_token(&tokens.refresh_token).unwrap();
        sqlx::query("UPDATE refresh_tokens SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(matches!(refresh(&pool, &config, &tokens.refresh_token).await, Err(Error::TokenExpired)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_session_limit_revokes_oldest(pool: PgPool) {
        let mut config = create_test_config();
        config.auth.max_sessions = 2;
        let user = create_test_user(&pool, Role::Staff).await;

        let oldest = login(&pool, &config, &login_request(&user.email), Some("one")).await.unwrap();
        login(&pool, &config, &login_request(&user.email), Some("two")).await.unwrap();
        let newest = login(&pool, &config, &login_request(&user.email), Some("three")).await.unwrap();

        let current = session::verify_access_token(&newest.access_token, &config).unwrap();
        let active = sessions(&pool, &current).await.unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().any(|s| s.current));
        assert!(active.iter().all(|s| s.user_agent.as_deref() != Some("one")));

        assert!(matches!(
            refresh(&pool, &config, &oldest.refresh_token).await,
            Err(Error::Unauthenticated { .. })
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_logout_and_logout_all(pool: PgPool) {
        let config = create_test_config();
        let user = create_test_user(&pool, Role::Staff).await;

        let a = login(&pool, &config, &login_request(&user.email), None).await.unwrap();
        let b = login(&pool, &config, &login_request(&user.email), None).await.unwrap();
        let c = login(&pool, &config, &login_request(&user.email), None).await.unwrap();

        assert_eq!(logout(&pool, &a.refresh_token).await.unwrap(), 1);
        // Second logout of the same session is a no-op
        assert_eq!(logout(&pool, &a.refresh_token).await.unwrap(), 0);
        assert!(refresh(&pool, &config, &a.refresh_token).await.is_err());

        let current = session::verify_access_token(&c.access_token, &config).unwrap();
        assert_eq!(logout_all(&pool, &current).await.unwrap(), 2);
        assert!(refresh(&pool, &config, &b.refresh_token).await.is_err());
        assert!(sessions(&pool, &current).await.unwrap().is_empty());
    }
}
