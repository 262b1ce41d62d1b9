use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            products::{SupplierCreate, SupplierResponse, SupplierUpdate},
            response::{ApiResponse, Deleted},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Repository, Suppliers, suppliers::SUPPLIER_FILTERS},
        models::products::{SupplierCreateDBRequest, SupplierUpdateDBRequest},
    },
    errors::{Error, Result},
    types::SupplierId,
};

#[tracing::instrument(skip_all)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<SupplierResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut Suppliers::new(&mut conn), &query, SUPPLIER_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(SupplierResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_suppliers(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<SupplierResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let suppliers = crud::list_all(&mut Suppliers::new(&mut conn), &query, SUPPLIER_FILTERS).await?;
    Ok(ApiResponse::ok(suppliers.into_iter().map(SupplierResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_supplier(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Path(id): Path<SupplierId>,
) -> Result<ApiResponse<SupplierResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let supplier = Suppliers::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(supplier, "Supplier", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_supplier(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Create>,
    Json(body): Json<SupplierCreate>,
) -> Result<ApiResponse<SupplierResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let supplier = Suppliers::new(&mut conn).create(&SupplierCreateDBRequest::from(body)).await?;
    Ok(ApiResponse::created(supplier.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_supplier(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Update>,
    Path(id): Path<SupplierId>,
    Json(body): Json<SupplierUpdate>,
) -> Result<ApiResponse<SupplierResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let supplier = Suppliers::new(&mut conn).update(id, &SupplierUpdateDBRequest::from(body)).await?;
    Ok(ApiResponse::ok(supplier.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Delete>,
    Path(id): Path<SupplierId>,
) -> Result<ApiResponse<Deleted<SupplierId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Suppliers::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Supplier", id)?))
}
