use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            recipes::{
                IngredientResponse, RecipeCategoryLink, RecipeCategoryResponse, RecipeCreate, RecipeResponse, RecipeUpdate, StepResponse,
            },
            response::{ApiResponse, Deleted},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Ingredients, RecipeCategories, Recipes, Repository, Steps, recipes::RECIPE_FILTERS},
        models::recipes::{RecipeCreateDBRequest, RecipeUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{RecipeCategoryId, RecipeId},
};

#[tracing::instrument(skip_all)]
pub async fn list_recipes(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<RecipeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut Recipes::new(&mut conn), &query, RECIPE_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(RecipeResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_recipes(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<RecipeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let recipes = crud::list_all(&mut Recipes::new(&mut conn), &query, RECIPE_FILTERS).await?;
    Ok(ApiResponse::ok(recipes.into_iter().map(RecipeResponse::from).collect()))
}

/// A recipe together with its categories, ingredients and steps.
#[tracing::instrument(skip_all)]
pub async fn get_recipe(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Path(id): Path<RecipeId>,
) -> Result<ApiResponse<RecipeResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let recipe = crud::found(Recipes::new(&mut tx).get_by_id(id).await?, "Recipe", id)?;
    let categories = RecipeCategories::new(&mut tx).list_for_recipe(id).await?;
    let ingredients = Ingredients::new(&mut tx).list_for_recipe(id).await?;
    let steps = Steps::new(&mut tx).list_for_recipe(id).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let response = RecipeResponse::from(recipe).with_details(
        categories.into_iter().map(RecipeCategoryResponse::from).collect(),
        ingredients.into_iter().map(IngredientResponse::from).collect(),
        steps.into_iter().map(StepResponse::from).collect(),
    );
    Ok(ApiResponse::ok(response))
}

#[tracing::instrument(skip_all)]
pub async fn create_recipe(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Recipes, operation::Create>,
    Json(body): Json<RecipeCreate>,
) -> Result<ApiResponse<RecipeResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let recipe = Recipes::new(&mut conn)
        .create(&RecipeCreateDBRequest::new(body, current_user.id))
        .await?;
    Ok(ApiResponse::created(recipe.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_recipe(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Update>,
    Path(id): Path<RecipeId>,
    Json(body): Json<RecipeUpdate>,
) -> Result<ApiResponse<RecipeResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let recipe = Recipes::new(&mut conn).update(id, &RecipeUpdateDBRequest::from(body)).await?;
    Ok(ApiResponse::ok(recipe.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Delete>,
    Path(id): Path<RecipeId>,
) -> Result<ApiResponse<Deleted<RecipeId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Recipes::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Recipe", id)?))
}

#[tracing::instrument(skip_all)]
pub async fn link_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Update>,
    Path((recipe_id, category_id)): Path<(RecipeId, RecipeCategoryId)>,
) -> Result<ApiResponse<RecipeCategoryLink>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Recipes::new(&mut conn).link_category(recipe_id, category_id).await?;
    Ok(ApiResponse::ok(RecipeCategoryLink {
        recipe_id,
        category_id,
        linked: true,
    }))
}

#[tracing::instrument(skip_all)]
pub async fn unlink_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Update>,
    Path((recipe_id, category_id)): Path<(RecipeId, RecipeCategoryId)>,
) -> Result<ApiResponse<RecipeCategoryLink>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Recipes::new(&mut conn).unlink_category(recipe_id, category_id).await? {
        return Err(crud::not_found("Recipe category link", format!("{recipe_id}/{category_id}")));
    }
    Ok(ApiResponse::ok(RecipeCategoryLink {
        recipe_id,
        category_id,
        linked: false,
    }))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            pagination::PaginatedResponse,
            recipes::{RecipeCategoryResponse, RecipeResponse, StepResponse},
            response::{ApiResponse, ErrorBody},
            users::Role,
        },
        test_utils::{create_test_server, login_as},
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    const RECIPES: &str = "/api/v1/admin/recipes/recipes";
    const CATEGORIES: &str = "/api/v1/admin/recipes/categories";
    const STEPS: &str = "/api/v1/admin/recipes/steps";
    const INGREDIENTS: &str = "/api/v1/admin/recipes/ingredients";

    #[sqlx::test]
    #[test_log::test]
    async fn test_recipe_detail_includes_children(pool: PgPool) {
        let (manager_user, manager) = login_as(&pool, Role::Manager).await;
        let server = create_test_server(pool);
        let auth = manager.as_str();

        let recipe: ApiResponse<RecipeResponse> = server
            .post(&format!("{RECIPES}/save"))
            .add_header("authorization", auth)
            .json(&json!({"name": "Focaccia", "servings": 8}))
            .await
            .json();
        assert_eq!(recipe.http_status_code, 201);
        assert_eq!(recipe.data.created_by, Some(manager_user.id));
        let recipe_id = recipe.data.id;

        let category: ApiResponse<RecipeCategoryResponse> = server
            .post(&format!("{CATEGORIES}/save"))
            .add_header("authorization", auth)
            .json(&json!({"name": "Bread"}))
            .await
            .json();

        server
            .post(&format!("{RECIPES}/{recipe_id}/categories/{}", category.data.id))
            .add_header("authorization", auth)
            .await
            .assert_status_ok();
        // Linking twice is fine
        server
            .post(&format!("{RECIPES}/{recipe_id}/categories/{}", category.data.id))
            .add_header("authorization", auth)
            .await
            .assert_status_ok();

        for (position, instruction) in [(2, "Bake"), (1, "Proof")] {
            server
                .post(&format!("{STEPS}/save"))
                .add_header("authorization", auth)
                .json(&json!({"recipe_id": recipe_id, "position": position, "instruction": instruction}))
                .await
                .assert_status(StatusCode::CREATED);
        }
        server
            .post(&format!("{INGREDIENTS}/save"))
            .add_header("authorization", auth)
            .json(&json!({"recipe_id": recipe_id, "name": "Flour", "quantity": "500"}))
            .await
            .assert_status(StatusCode::CREATED);

        let detail: ApiResponse<RecipeResponse> = server
            .get(&format!("{RECIPES}/detail/{recipe_id}"))
            .add_header("authorization", auth)
            .await
            .json();
        let steps: Vec<StepResponse> = detail.data.steps.unwrap();
        assert_eq!(steps.iter().map(|s| s.position).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(detail.data.categories.unwrap().len(), 1);
        assert_eq!(detail.data.ingredients.unwrap()[0].name, "Flour");

        let filtered: ApiResponse<PaginatedResponse<RecipeResponse>> = server
            .get(&format!("{RECIPES}/list?category_id={}", category.data.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert_eq!(filtered.data.total_count, 1);

        server
            .delete(&format!("{RECIPES}/{recipe_id}/categories/{}", category.data.id))
            .add_header("authorization", auth)
            .await
            .assert_status_ok();
        server
            .delete(&format!("{RECIPES}/{recipe_id}/categories/{}", category.data.id))
            .add_header("authorization", auth)
            .await
            .assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_step_position_conflicts(pool: PgPool) {
        let (_, manager) = login_as(&pool, Role::Manager).await;
        let server = create_test_server(pool);

        let recipe: ApiResponse<RecipeResponse> = server
            .post(&format!("{RECIPES}/save"))
            .add_header("authorization", manager.as_str())
            .json(&json!({"name": "Soup"}))
            .await
            .json();

        let step = json!({"recipe_id": recipe.data.id, "position": 1, "instruction": "Chop"});
        server
            .post(&format!("{STEPS}/save"))
            .add_header("authorization", manager.as_str())
            .json(&step)
            .await
            .assert_status(StatusCode::CREATED);
        let response = server
            .post(&format!("{STEPS}/save"))
            .add_header("authorization", manager.as_str())
            .json(&step)
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: ApiResponse<ErrorBody> = response.json();
        assert_eq!(body.data.message, "This recipe already has a step at that position");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_recipe_and_bad_filter(pool: PgPool) {
        let (_, viewer) = login_as(&pool, Role::Viewer).await;
        let server = create_test_server(pool);

        server
            .get(&format!("{RECIPES}/detail/{}", uuid::Uuid::new_v4()))
            .add_header("authorization", viewer.as_str())
            .await
            .assert_status_not_found();

        server
            .get(&format!("{RECIPES}/list?created_by=not-a-uuid"))
            .add_header("authorization", viewer.as_str())
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Unknown parameters are ignored
        server
            .get(&format!("{RECIPES}/list?colour=green"))
            .add_header("authorization", viewer.as_str())
            .await
            .assert_status_ok();

        server
            .post(&format!("{RECIPES}/save"))
            .add_header("authorization", viewer.as_str())
            .json(&json!({"name": "Not allowed"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
