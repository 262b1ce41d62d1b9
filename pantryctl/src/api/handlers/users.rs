use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            response::{ApiResponse, Deleted},
            users::{Role, UserCreate, UserResponse, UserUpdate},
        },
    },
    auth::{
        password::{self, Argon2Params},
        permissions::{RequiresPermission, operation, resource},
    },
    db::{
        handlers::{Repository, Users, users::USER_FILTERS},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::UserId,
};

#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut Users::new(&mut conn), &query, USER_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(UserResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_users(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let users = crud::list_all(&mut Users::new(&mut conn), &query, USER_FILTERS).await?;
    Ok(ApiResponse::ok(users.into_iter().map(UserResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::Read>,
    Path(id): Path<UserId>,
) -> Result<ApiResponse<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(user, "User", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::Create>,
    Json(body): Json<UserCreate>,
) -> Result<ApiResponse<UserResponse>> {
    body.validate()?;
    let password_config = &state.config.auth.password;
    password::validate_length(&body.password, password_config)?;
    let password_hash = password::hash_password(body.password, Argon2Params::from(password_config)).await?;

    let request = UserCreateDBRequest {
        username: body.username.trim().to_string(),
        email: body.email.trim().to_lowercase(),
        password_hash,
        display_name: body.display_name,
        role: body.role.unwrap_or(Role::Viewer),
        is_active: body.is_active.unwrap_or(true),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).create(&request).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "Created user");
    Ok(ApiResponse::created(user.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::Update>,
    Path(id): Path<UserId>,
    Json(mut body): Json<UserUpdate>,
) -> Result<ApiResponse<UserResponse>> {
    body.validate()?;
    body.email = body.email.map(|email| email.trim().to_lowercase());

    let password_hash = match body.password.take() {
        Some(new_password) => {
            let password_config = &state.config.auth.password;
            password::validate_length(&new_password, password_config)?;
            Some(password::hash_password(new_password, Argon2Params::from(password_config)).await?)
        }
        None => None,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .update(id, &UserUpdateDBRequest::new(body, password_hash))
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Users, operation::Delete>,
    Path(id): Path<UserId>,
) -> Result<ApiResponse<Deleted<UserId>>> {
    if current_user.id == id {
        return Err(Error::Unprocessable {
            message: "You cannot delete your own account".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Users::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "User", id)?))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            pagination::PaginatedResponse,
            response::{ApiResponse, Deleted, ErrorBody},
            users::{Role, UserResponse},
        },
        test_utils::{create_test_server, login_as},
        types::UserId,
    };
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    const BASE: &str = "/api/v1/admin/users/users";

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_fetch_user(pool: PgPool) {
        let (_, admin) = login_as(&pool, Role::Admin).await;
        let server = create_test_server(pool);

        let response = server
            .post(&format!("{BASE}/save"))
            .add_header("authorization", admin.as_str())
            .json(&json!({
                "username": "line-cook",
                "email": "Cook@Pantry.Test",
                "password": "long-enough-password",
                "role": "STAFF",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let raw: Value = response.json();
        assert_eq!(raw["httpStatusCode"], 201);
        assert!(raw["data"].get("password_hash").is_none());

        let created: ApiResponse<UserResponse> = response.json();
        assert_eq!(created.data.email, "cook@pantry.test");
        assert_eq!(created.data.role, Role::Staff);

        let fetched: ApiResponse<UserResponse> = server
            .get(&format!("{BASE}/detail/{}", created.data.id))
            .add_header("authorization", admin.as_str())
            .await
            .json();
        assert_eq!(fetched.data.username, "line-cook");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_short_password_and_duplicate_email(pool: PgPool) {
        let (admin_user, admin) = login_as(&pool, Role::Admin).await;
        let server = create_test_server(pool);

        let response = server
            .post(&format!("{BASE}/save"))
            .add_header("authorization", admin.as_str())
            .json(&json!({"username": "shorty", "email": "shorty@pantry.test", "password": "abc"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post(&format!("{BASE}/save"))
            .add_header("authorization", admin.as_str())
            .json(&json!({"username": "copycat", "email": admin_user.email, "password": "long-enough-password"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: ApiResponse<ErrorBody> = response.json();
        assert_eq!(body.data.error, "Conflict");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cannot_delete_self(pool: PgPool) {
        let (admin_user, admin) = login_as(&pool, Role::Admin).await;
        let (viewer, _) = login_as(&pool, Role::Viewer).await;
        let server = create_test_server(pool);

        server
            .delete(&format!("{BASE}/delete/{}", admin_user.id))
            .add_header("authorization", admin.as_str())
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let response = server
            .delete(&format!("{BASE}/delete/{}", viewer.id))
            .add_header("authorization", admin.as_str())
            .await;
        response.assert_status_ok();
        let body: ApiResponse<Deleted<UserId>> = response.json();
        assert_eq!(body.data.id, viewer.id);
        assert!(body.data.deleted);

        server
            .delete(&format!("{BASE}/delete/{}", viewer.id))
            .add_header("authorization", admin.as_str())
            .await
            .assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_manager_reads_but_cannot_create(pool: PgPool) {
        let (_, manager) = login_as(&pool, Role::Manager).await;
        let (_, staff) = login_as(&pool, Role::Staff).await;
        let server = create_test_server(pool);

        let page: ApiResponse<PaginatedResponse<UserResponse>> = server
            .get(&format!("{BASE}/list?role=STAFF"))
            .add_header("authorization", manager.as_str())
            .await
            .json();
        assert_eq!(page.data.total_count, 1);
        assert_eq!(page.data.data[0].role, Role::Staff);

        server
            .post(&format!("{BASE}/save"))
            .add_header("authorization", manager.as_str())
            .json(&json!({"username": "x", "email": "x@pantry.test", "password": "long-enough-password"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .get(&format!("{BASE}/list"))
            .add_header("authorization", staff.as_str())
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
