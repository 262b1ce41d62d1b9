//! Inventory handlers.
//!
//! Inventory rows are created empty; quantities only change through stock
//! movements and the reserve/release endpoints here.

use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            response::{ApiResponse, Deleted},
            stock::{
                InventoryCreate, InventoryResponse, InventorySummaryQuery, InventorySummaryResponse, InventoryUpdate, QuantityRequest,
            },
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Inventories, Repository, inventories::INVENTORY_FILTERS},
        models::stock::{InventoryCreateDBRequest, InventoryUpdateDBRequest},
    },
    errors::{Error, Result},
    types::InventoryId,
};

#[tracing::instrument(skip_all)]
pub async fn list_inventories(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<InventoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut Inventories::new(&mut conn), &query, INVENTORY_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(InventoryResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_inventories(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<InventoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = crud::list_all(&mut Inventories::new(&mut conn), &query, INVENTORY_FILTERS).await?;
    Ok(ApiResponse::ok(rows.into_iter().map(InventoryResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_inventory(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Path(id): Path<InventoryId>,
) -> Result<ApiResponse<InventoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Inventories::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(row, "Inventory", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_inventory(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Create>,
    Json(body): Json<InventoryCreate>,
) -> Result<ApiResponse<InventoryResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Inventories::new(&mut conn).create(&InventoryCreateDBRequest::from(body)).await?;
    Ok(ApiResponse::created(row.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_inventory(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Update>,
    Path(id): Path<InventoryId>,
    Json(body): Json<InventoryUpdate>,
) -> Result<ApiResponse<InventoryResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Inventories::new(&mut conn).update(id, &InventoryUpdateDBRequest::from(body)).await?;
    Ok(ApiResponse::ok(row.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_inventory(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Delete>,
    Path(id): Path<InventoryId>,
) -> Result<ApiResponse<Deleted<InventoryId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Inventories::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Inventory", id)?))
}

#[tracing::instrument(skip_all)]
pub async fn reserve(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Update>,
    Path(id): Path<InventoryId>,
    Json(body): Json<QuantityRequest>,
) -> Result<ApiResponse<InventoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Inventories::new(&mut conn).reserve(id, body.quantity).await?;
    Ok(ApiResponse::ok(row.into()))
}

#[tracing::instrument(skip_all)]
pub async fn release(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Update>,
    Path(id): Path<InventoryId>,
    Json(body): Json<QuantityRequest>,
) -> Result<ApiResponse<InventoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Inventories::new(&mut conn).release(id, body.quantity).await?;
    Ok(ApiResponse::ok(row.into()))
}

/// Rows at or below their minimum stock, most depleted first.
#[tracing::instrument(skip_all)]
pub async fn low_stock(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<InventoryResponse>>> {
    let filter = query.to_unpaginated_filter(INVENTORY_FILTERS)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Inventories::new(&mut conn).low_stock(&filter).await?;
    Ok(ApiResponse::ok(rows.into_iter().map(InventoryResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn summary(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Query(query): Query<InventorySummaryQuery>,
) -> Result<ApiResponse<InventorySummaryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let summary = Inventories::new(&mut conn).summary(query.warehouse_id).await?;
    Ok(ApiResponse::ok(summary.into()))
}
