use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            recipes::{StepCreate, StepResponse, StepUpdate},
            response::{ApiResponse, Deleted},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Repository, Steps, steps::STEP_FILTERS},
        models::recipes::{StepCreateDBRequest, StepUpdateDBRequest},
    },
    errors::{Error, Result},
    types::StepId,
};

#[tracing::instrument(skip_all)]
pub async fn list_steps(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<StepResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut Steps::new(&mut conn), &query, STEP_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(StepResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_steps(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<StepResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let steps = crud::list_all(&mut Steps::new(&mut conn), &query, STEP_FILTERS).await?;
    Ok(ApiResponse::ok(steps.into_iter().map(StepResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_step(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Path(id): Path<StepId>,
) -> Result<ApiResponse<StepResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let step = Steps::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(step, "Step", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_step(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Create>,
    Json(body): Json<StepCreate>,
) -> Result<ApiResponse<StepResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let step = Steps::new(&mut conn).create(&StepCreateDBRequest::from(body)).await?;
    Ok(ApiResponse::created(step.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_step(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Update>,
    Path(id): Path<StepId>,
    Json(body): Json<StepUpdate>,
) -> Result<ApiResponse<StepResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let step = Steps::new(&mut conn).update(id, &StepUpdateDBRequest::from(body)).await?;
    Ok(ApiResponse::ok(step.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_step(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Delete>,
    Path(id): Path<StepId>,
) -> Result<ApiResponse<Deleted<StepId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Steps::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Step", id)?))
}
