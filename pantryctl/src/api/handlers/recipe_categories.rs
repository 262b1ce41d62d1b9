use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            recipes::{RecipeCategoryCreate, RecipeCategoryResponse, RecipeCategoryUpdate},
            response::{ApiResponse, Deleted},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{RecipeCategories, Repository, recipe_categories::RECIPE_CATEGORY_FILTERS},
        models::recipes::{RecipeCategoryCreateDBRequest, RecipeCategoryUpdateDBRequest},
    },
    errors::{Error, Result},
    types::RecipeCategoryId,
};

#[tracing::instrument(skip_all)]
pub async fn list_categories(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<RecipeCategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut RecipeCategories::new(&mut conn), &query, RECIPE_CATEGORY_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(RecipeCategoryResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_categories(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<RecipeCategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let categories = crud::list_all(&mut RecipeCategories::new(&mut conn), &query, RECIPE_CATEGORY_FILTERS).await?;
    Ok(ApiResponse::ok(categories.into_iter().map(RecipeCategoryResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Path(id): Path<RecipeCategoryId>,
) -> Result<ApiResponse<RecipeCategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = RecipeCategories::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(category, "Recipe category", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Create>,
    Json(body): Json<RecipeCategoryCreate>,
) -> Result<ApiResponse<RecipeCategoryResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = RecipeCategories::new(&mut conn)
        .create(&RecipeCategoryCreateDBRequest::from(body))
        .await?;
    Ok(ApiResponse::created(category.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Update>,
    Path(id): Path<RecipeCategoryId>,
    Json(body): Json<RecipeCategoryUpdate>,
) -> Result<ApiResponse<RecipeCategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = RecipeCategories::new(&mut conn)
        .update(id, &RecipeCategoryUpdateDBRequest::from(body))
        .await?;
    Ok(ApiResponse::ok(category.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Delete>,
    Path(id): Path<RecipeCategoryId>,
) -> Result<ApiResponse<Deleted<RecipeCategoryId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = RecipeCategories::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Recipe category", id)?))
}
