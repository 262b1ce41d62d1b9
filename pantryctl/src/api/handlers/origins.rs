use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            products::{OriginCreate, OriginResponse, OriginUpdate},
            response::{ApiResponse, Deleted},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Origins, Repository, origins::ORIGIN_FILTERS},
        models::products::{OriginCreateDBRequest, OriginUpdateDBRequest},
    },
    errors::{Error, Result},
    types::OriginId,
};

#[tracing::instrument(skip_all)]
pub async fn list_origins(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<OriginResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut Origins::new(&mut conn), &query, ORIGIN_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(OriginResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_origins(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<OriginResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let origins = crud::list_all(&mut Origins::new(&mut conn), &query, ORIGIN_FILTERS).await?;
    Ok(ApiResponse::ok(origins.into_iter().map(OriginResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_origin(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Path(id): Path<OriginId>,
) -> Result<ApiResponse<OriginResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let origin = Origins::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(origin, "Origin", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_origin(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Create>,
    Json(body): Json<OriginCreate>,
) -> Result<ApiResponse<OriginResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let origin = Origins::new(&mut conn).create(&OriginCreateDBRequest::from(body)).await?;
    Ok(ApiResponse::created(origin.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_origin(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Update>,
    Path(id): Path<OriginId>,
    Json(body): Json<OriginUpdate>,
) -> Result<ApiResponse<OriginResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let origin = Origins::new(&mut conn).update(id, &OriginUpdateDBRequest::from(body)).await?;
    Ok(ApiResponse::ok(origin.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_origin(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Delete>,
    Path(id): Path<OriginId>,
) -> Result<ApiResponse<Deleted<OriginId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Origins::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Origin", id)?))
}
