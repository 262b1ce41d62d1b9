use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            response::{ApiResponse, Deleted},
            stock::{WarehouseCreate, WarehouseResponse, WarehouseUpdate},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Repository, Warehouses, warehouses::WAREHOUSE_FILTERS},
        models::stock::{WarehouseCreateDBRequest, WarehouseUpdateDBRequest},
    },
    errors::{Error, Result},
    types::WarehouseId,
};

#[tracing::instrument(skip_all)]
pub async fn list_warehouses(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<WarehouseResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut Warehouses::new(&mut conn), &query, WAREHOUSE_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(WarehouseResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_warehouses(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<WarehouseResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let warehouses = crud::list_all(&mut Warehouses::new(&mut conn), &query, WAREHOUSE_FILTERS).await?;
    Ok(ApiResponse::ok(warehouses.into_iter().map(WarehouseResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_warehouse(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Read>,
    Path(id): Path<WarehouseId>,
) -> Result<ApiResponse<WarehouseResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let warehouse = Warehouses::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(warehouse, "Warehouse", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Create>,
    Json(body): Json<WarehouseCreate>,
) -> Result<ApiResponse<WarehouseResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let warehouse = Warehouses::new(&mut conn).create(&WarehouseCreateDBRequest::from(body)).await?;
    Ok(ApiResponse::created(warehouse.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_warehouse(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Update>,
    Path(id): Path<WarehouseId>,
    Json(body): Json<WarehouseUpdate>,
) -> Result<ApiResponse<WarehouseResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let warehouse = Warehouses::new(&mut conn).update(id, &WarehouseUpdateDBRequest::from(body)).await?;
    Ok(ApiResponse::ok(warehouse.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_warehouse(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Stock, operation::Delete>,
    Path(id): Path<WarehouseId>,
) -> Result<ApiResponse<Deleted<WarehouseId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Warehouses::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Warehouse", id)?))
}
