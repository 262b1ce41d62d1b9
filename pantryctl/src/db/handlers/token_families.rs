//! Database repository for token families and their refresh tokens.
//!
//! A family is one login session. Each refresh hands out a new token in the
//! same family and marks the previous one used; a used token coming back means
//! the family has leaked and the whole family is revoked.

use crate::db::{
    errors::Result,
    models::token_families::{RefreshTokenDBResponse, RevocationReason, TokenFamilyDBResponse},
};
use crate::types::{RefreshTokenId, TokenFamilyId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

pub struct TokenFamilies<'c> {
    db: &'c mut PgConnection,
}

impl<'c> TokenFamilies<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, user_agent), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn create_family(&mut self, user_id: UserId, user_agent: Option<&str>) -> Result<TokenFamilyDBResponse> {
        let family = sqlx::query_as::<_, TokenFamilyDBResponse>(
            "INSERT INTO token_families (user_id, user_agent) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(user_agent)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(family)
    }

    #[instrument(skip(self), fields(family_id = %abbrev_uuid(&id)), err)]
    pub async fn get_family(&mut self, id: TokenFamilyId) -> Result<Option<TokenFamilyDBResponse>> {
        let family = sqlx::query_as::<_, TokenFamilyDBResponse>("SELECT * FROM token_families WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(family)
    }

    /// Active (non-revoked) families of a user, newest first.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_active(&mut self, user_id: UserId) -> Result<Vec<TokenFamilyDBResponse>> {
        let families = sqlx::query_as::<_, TokenFamilyDBResponse>(
            "SELECT * FROM token_families WHERE user_id = $1 AND revoked_at IS NULL ORDER BY created_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(families)
    }

    /// Revoke the user's oldest active families so that at most `keep` remain.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn revoke_beyond(&mut self, user_id: UserId, keep: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE token_families SET revoked_at = NOW(), revoked_reason = $3
            WHERE id IN (
                SELECT id FROM token_families
                WHERE user_id = $1 AND revoked_at IS NULL
                ORDER BY created_at DESC, id DESC
                OFFSET $2
            )
            "#,
        )
        .bind(user_id)
        .bind(keep.max(0))
        .bind(RevocationReason::SessionLimit.as_str())
        .execute(&mut *self.db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Revoke one family. Already-revoked families keep their original reason.
    #[instrument(skip(self), fields(family_id = %abbrev_uuid(&id)), err)]
    pub async fn revoke_family(&mut self, id: TokenFamilyId, reason: RevocationReason) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE token_families SET revoked_at = NOW(), revoked_reason = $2 WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(reason.as_str())
        .execute(&mut *self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn revoke_all_for_user(&mut self, user_id: UserId, reason: RevocationReason) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE token_families SET revoked_at = NOW(), revoked_reason = $2 WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .bind(reason.as_str())
        .execute(&mut *self.db)
        .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(family_id = %abbrev_uuid(&id)), err)]
    pub async fn touch_family(&mut self, id: TokenFamilyId) -> Result<()> {
        sqlx::query("UPDATE token_families SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token_hash), fields(family_id = %abbrev_uuid(&family_id)), err)]
    pub async fn insert_token(
        &mut self,
        family_id: TokenFamilyId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenDBResponse> {
        let token = sqlx::query_as::<_, RefreshTokenDBResponse>(
            "INSERT INTO refresh_tokens (family_id, token_hash, expires_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(family_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(token)
    }

    #[instrument(skip(self), fields(token_id = %abbrev_uuid(&id)), err)]
    pub async fn get_token(&mut self, id: RefreshTokenId) -> Result<Option<RefreshTokenDBResponse>> {
        let token = sqlx::query_as::<_, RefreshTokenDBResponse>("SELECT * FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(token)
    }

    /// Atomically mark a token used. Returns `None` when it had already been used.
    #[instrument(skip(self), fields(token_id = %abbrev_uuid(&id)), err)]
    pub async fn mark_used(&mut self, id: RefreshTokenId) -> Result<Option<RefreshTokenDBResponse>> {
        let token = sqlx::query_as::<_, RefreshTokenDBResponse>(
            "UPDATE refresh_tokens SET used_at = NOW() WHERE id = $1 AND used_at IS NULL RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::handlers::{Repository, Users};
    use crate::db::models::users::UserCreateDBRequest;
    use chrono::Duration;
    use sqlx::PgPool;

    async fn create_user(conn: &mut PgConnection) -> UserId {
        Users::new(conn)
            .create(&UserCreateDBRequest {
                username: "sessions".to_string(),
                email: "sessions@example.com".to_string(),
                password_hash: "hash".to_string(),
                display_name: None,
                role: Role::Viewer,
                is_active: true,
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_mark_used_only_once(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn).await;
        let mut repo = TokenFamilies::new(&mut conn);

        let family = repo.create_family(user_id, Some("curl/8")).await.unwrap();
        let token = repo
            .insert_token(family.id, "hash", Utc::now() + Duration::days(1))
            .await
            .unwrap();

        assert!(repo.mark_used(token.id).await.unwrap().is_some());
        assert!(repo.mark_used(token.id).await.unwrap().is_none());
        assert!(repo.get_token(token.id).await.unwrap().unwrap().used_at.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_revoke_beyond_keeps_newest(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn).await;
        let mut repo = TokenFamilies::new(&mut conn);

        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(repo.create_family(user_id, None).await.unwrap().id);
        }

        let revoked = repo.revoke_beyond(user_id, 2).await.unwrap();
        assert_eq!(revoked, 2);

        let active = repo.list_active(user_id).await.unwrap();
        assert_eq!(active.len(), 2);
        let oldest = repo.get_family(ids[0]).await.unwrap().unwrap();
        assert!(oldest.is_revoked());
        assert_eq!(oldest.revoked_reason.as_deref(), Some("session_limit"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_revoke_family_is_idempotent(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn).await;
        let mut repo = TokenFamilies::new(&mut conn);

        let family = repo.create_family(user_id, None).await.unwrap();
        assert!(repo.revoke_family(family.id, RevocationReason::ReuseDetected).await.unwrap());
        assert!(!repo.revoke_family(family.id, RevocationReason::Logout).await.unwrap());

        let family = repo.get_family(family.id).await.unwrap().unwrap();
        assert_eq!(family.revoked_reason.as_deref(), Some("reuse_detected"));
    }
}
