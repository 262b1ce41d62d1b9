use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            response::{ApiResponse, Deleted},
            units::{UnitCreate, UnitResponse, UnitUpdate},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Repository, Units, units::UNIT_FILTERS},
        models::units::{UnitCreateDBRequest, UnitUpdateDBRequest},
    },
    errors::{Error, Result},
    types::UnitId,
};

#[tracing::instrument(skip_all)]
pub async fn list_units(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<UnitResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut Units::new(&mut conn), &query, UNIT_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(UnitResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_units(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<UnitResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let units = crud::list_all(&mut Units::new(&mut conn), &query, UNIT_FILTERS).await?;
    Ok(ApiResponse::ok(units.into_iter().map(UnitResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_unit(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Read>,
    Path(id): Path<UnitId>,
) -> Result<ApiResponse<UnitResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let unit = Units::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(unit, "Unit", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_unit(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Create>,
    Json(body): Json<UnitCreate>,
) -> Result<ApiResponse<UnitResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let unit = Units::new(&mut conn).create(&UnitCreateDBRequest::from(body)).await?;
    Ok(ApiResponse::created(unit.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_unit(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Update>,
    Path(id): Path<UnitId>,
    Json(body): Json<UnitUpdate>,
) -> Result<ApiResponse<UnitResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let unit = Units::new(&mut conn).update(id, &UnitUpdateDBRequest::from(body)).await?;
    Ok(ApiResponse::ok(unit.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_unit(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Delete>,
    Path(id): Path<UnitId>,
) -> Result<ApiResponse<Deleted<UnitId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Units::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Unit", id)?))
}
