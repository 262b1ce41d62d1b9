//! HTTP handlers for login sessions.
//!
//! The session rules themselves live in [`crate::auth::session_service`]; these
//! handlers only unpack requests and wrap results in the envelope.

use axum::{
    extract::State,
    http::{HeaderMap, header::USER_AGENT},
};

use crate::{
    AppState,
    api::{
        extract::Json,
        handlers::crud,
        models::{
            auth::{LoginRequest, LogoutResponse, RefreshRequest, SessionResponse, TokenResponse},
            response::ApiResponse,
            users::{CurrentUser, UserResponse},
        },
    },
    auth::session_service,
    db::handlers::{Repository, Users},
    errors::{Error, Result},
};

#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<TokenResponse>> {
    if request.login.trim().is_empty() || request.password.is_empty() {
        return Err(Error::BadRequest {
            message: "login and password are required".to_string(),
        });
    }

    let user_agent = headers.get(USER_AGENT).and_then(|value| value.to_str().ok());
    let tokens = session_service::login(&state.db, &state.config, &request, user_agent).await?;
    Ok(ApiResponse::ok(tokens))
}

#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, Json(request): Json<RefreshRequest>) -> Result<ApiResponse<TokenResponse>> {
    let tokens = session_service::refresh(&state.db, &state.config, &request.refresh_token).await?;
    Ok(ApiResponse::ok(tokens))
}

#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, Json(request): Json<RefreshRequest>) -> Result<ApiResponse<LogoutResponse>> {
    let revoked = session_service::logout(&state.db, &request.refresh_token).await?;
    Ok(ApiResponse::ok(LogoutResponse { revoked }))
}

#[tracing::instrument(skip_all)]
pub async fn logout_all(State(state): State<AppState>, current_user: CurrentUser) -> Result<ApiResponse<LogoutResponse>> {
    let revoked = session_service::logout_all(&state.db, &current_user).await?;
    Ok(ApiResponse::ok(LogoutResponse { revoked }))
}

#[tracing::instrument(skip_all)]
pub async fn sessions(State(state): State<AppState>, current_user: CurrentUser) -> Result<ApiResponse<Vec<SessionResponse>>> {
    let sessions = session_service::sessions(&state.db, &current_user).await?;
    Ok(ApiResponse::ok(sessions))
}

/// The authenticated caller, read fresh from the database.
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<ApiResponse<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(current_user.id).await?;
    let user = crud::found(user, "User", current_user.id)?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}
