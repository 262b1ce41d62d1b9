use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    db::handlers::TokenFamilies,
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Pull the bearer token out of the `Authorization` header.
/// Returns:
/// - Ok(None): no `Authorization` header
/// - Ok(Some(token)): a `Bearer` token
/// - Err(_): a header that is not valid text or uses another scheme
fn bearer_token(parts: &Parts) -> Result<Option<&str>> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = header.to_str().map_err(|e| Error::Unauthenticated {
        message: Some(format!("Invalid authorization header: {e}")),
    })?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(Error::Unauthenticated {
            message: Some("Authorization header must use the Bearer scheme".to_string()),
        }),
    }
}

/// Access tokens die with their session: a token whose `sid` family has been
/// revoked (logout, reuse detection, session limit) is rejected before expiry.
async fn ensure_session_active(state: &AppState, user: &CurrentUser) -> Result<()> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    match TokenFamilies::new(&mut conn).get_family(user.session_id).await? {
        Some(family) if family.user_id == user.id && !family.is_revoked() => Ok(()),
        _ => Err(Error::Unauthenticated {
            message: Some("Session has been revoked".to_string()),
        }),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(token) = bearer_token(parts)? else {
            trace!("No authentication credentials found in request");
            return Err(Error::Unauthenticated { message: None });
        };

        let user = session::verify_access_token(token, &state.config)?;
        ensure_session_active(state, &user).await?;
        debug!(user_id = %user.id, role = %user.role, "Authenticated bearer token");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::users::{CurrentUser, Role},
        auth::session,
        db::{handlers::TokenFamilies, models::token_families::RevocationReason},
        errors::Error,
        test_utils::{create_test_config, create_test_state, create_test_user},
    };
    use axum::{extract::FromRequestParts as _, http::request::Parts};
    use sqlx::PgPool;
    use uuid::Uuid;

    fn parts_with_authorization(value: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/test");
        if let Some(value) = value {
            builder = builder.header("authorization", value);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    async fn user_with_session(pool: &PgPool) -> CurrentUser {
        let user = create_test_user(pool, Role::Viewer).await;
        let mut conn = pool.acquire().await.unwrap();
        let family = TokenFamilies::new(&mut conn).create_family(user.id, None).await.unwrap();
        CurrentUser {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            session_id: family.id,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_valid_bearer_token(pool: PgPool) {
        let user = user_with_session(&pool).await;
        let state = create_test_state(pool);
        let token = session::create_access_token(&user, &create_test_config()).unwrap();

        let mut parts = parts_with_authorization(Some(&format!("Bearer {token}")));
        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.id, user.id);
        assert_eq!(extracted.role, Role::Viewer);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_revoked_or_unknown_session_is_rejected(pool: PgPool) {
        let user = user_with_session(&pool).await;
        let config = create_test_config();

        let mut conn = pool.acquire().await.unwrap();
        TokenFamilies::new(&mut conn)
            .revoke_family(user.session_id, RevocationReason::Logout)
            .await
            .unwrap();
        drop(conn);
        let state = create_test_state(pool);

        let token = session::create_access_token(&user, &config).unwrap();
        let mut parts = parts_with_authorization(Some(&format!("Bearer {token}")));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
        assert_eq!(err.user_message(), "Session has been revoked");

        let stranger = CurrentUser {
            session_id: Uuid::new_v4(),
            ..user
        };
        let token = session::create_access_token(&stranger, &config).unwrap();
        let mut parts = parts_with_authorization(Some(&format!("Bearer {token}")));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_header_is_unauthenticated(pool: PgPool) {
        let state = create_test_state(pool);
        let mut parts = parts_with_authorization(None);

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_wrong_scheme_and_garbage(pool: PgPool) {
        let state = create_test_state(pool);

        let mut parts = parts_with_authorization(Some("Basic Zm9vOmJhcg=="));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));

        let mut parts = parts_with_authorization(Some("Bearer nonsense"));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::InvalidToken { .. }));
    }
}
