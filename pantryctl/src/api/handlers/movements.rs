//! Stock movement handlers.
//!
//! Movements are the only way quantities change. Creating one as COMPLETED,
//! or moving it to COMPLETED through [`update_status`], applies it to
//! inventory in the same transaction.

use axum::extract::State;
use tracing::info;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            response::{ApiResponse, Deleted},
            stock::{StatusUpdate, StockMovementCreate, StockMovementResponse, StockMovementUpdate},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Repository, StockMovements, stock_movements::STOCK_MOVEMENT_FILTERS},
        models::stock::{StockMovementCreateDBRequest, StockMovementUpdateDBRequest},
    },
    errors::{Error, Result},
    types::StockMovementId,
};

#[tracing::instrument(skip_all)]
pub async fn list_movements(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<StockMovementResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut StockMovements::new(&mut conn), &query, STOCK_MOVEMENT_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(StockMovementResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_movements(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<StockMovementResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let movements = crud::list_all(&mut StockMovements::new(&mut conn), &query, STOCK_MOVEMENT_FILTERS).await?;
    Ok(ApiResponse::ok(movements.into_iter().map(StockMovementResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_movement(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Path(id): Path<StockMovementId>,
) -> Result<ApiResponse<StockMovementResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let movement = StockMovements::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(movement, "Stock movement", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_movement(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Stock, operation::Create>,
    Json(body): Json<StockMovementCreate>,
) -> Result<ApiResponse<StockMovementResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let movement = StockMovements::new(&mut conn)
        .create(&StockMovementCreateDBRequest::new(body, current_user.id))
        .await?;
    info!(reference = %movement.reference, status = %movement.status, "Created stock movement");
    Ok(ApiResponse::created(movement.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_movement(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Update>,
    Path(id): Path<StockMovementId>,
    Json(body): Json<StockMovementUpdate>,
) -> Result<ApiResponse<StockMovementResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let movement = StockMovements::new(&mut conn)
        .update(id, &StockMovementUpdateDBRequest::from(body))
        .await?;
    Ok(ApiResponse::ok(movement.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_movement(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Delete>,
    Path(id): Path<StockMovementId>,
) -> Result<ApiResponse<Deleted<StockMovementId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = StockMovements::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Stock movement", id)?))
}

#[tracing::instrument(skip_all)]
pub async fn update_status(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Update>,
    Path(id): Path<StockMovementId>,
    Json(body): Json<StatusUpdate>,
) -> Result<ApiResponse<StockMovementResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let movement = StockMovements::new(&mut conn).transition(id, body.status).await?;
    Ok(ApiResponse::ok(movement.into()))
}
