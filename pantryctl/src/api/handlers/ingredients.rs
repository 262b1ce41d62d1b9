use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            recipes::{IngredientCreate, IngredientResponse, IngredientUpdate},
            response::{ApiResponse, Deleted},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Ingredients, Repository, ingredients::INGREDIENT_FILTERS},
        models::recipes::{IngredientCreateDBRequest, IngredientUpdateDBRequest},
    },
    errors::{Error, Result},
    types::IngredientId,
};

#[tracing::instrument(skip_all)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<IngredientResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut Ingredients::new(&mut conn), &query, INGREDIENT_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(IngredientResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_ingredients(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<IngredientResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let ingredients = crud::list_all(&mut Ingredients::new(&mut conn), &query, INGREDIENT_FILTERS).await?;
    Ok(ApiResponse::ok(ingredients.into_iter().map(IngredientResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Read>,
    Path(id): Path<IngredientId>,
) -> Result<ApiResponse<IngredientResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let ingredient = Ingredients::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(ingredient, "Ingredient", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Create>,
    Json(body): Json<IngredientCreate>,
) -> Result<ApiResponse<IngredientResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let ingredient = Ingredients::new(&mut conn).create(&IngredientCreateDBRequest::from(body)).await?;
    Ok(ApiResponse::created(ingredient.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_ingredient(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Update>,
    Path(id): Path<IngredientId>,
    Json(body): Json<IngredientUpdate>,
) -> Result<ApiResponse<IngredientResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let ingredient = Ingredients::new(&mut conn)
        .update(id, &IngredientUpdateDBRequest::from(body))
        .await?;
    Ok(ApiResponse::ok(ingredient.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Recipes, operation::Delete>,
    Path(id): Path<IngredientId>,
) -> Result<ApiResponse<Deleted<IngredientId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Ingredients::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Ingredient", id)?))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            recipes::{IngredientResponse, RecipeResponse},
            response::{ApiResponse, Deleted, ErrorBody},
            users::Role,
        },
        test_utils::{create_test_server, login_as},
    };
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sqlx::PgPool;
    use uuid::Uuid;

    const INGREDIENTS: &str = "/api/v1/admin/recipes/ingredients";

    #[sqlx::test]
    #[test_log::test]
    async fn test_ingredient_crud_round_trip(pool: PgPool) {
        let (_, manager) = login_as(&pool, Role::Manager).await;
        let server = create_test_server(pool);
        let auth = manager.as_str();

        let recipe: ApiResponse<RecipeResponse> = server
            .post("/api/v1/admin/recipes/recipes/save")
            .add_header("authorization", auth)
            .json(&json!({"name": "Pancakes"}))
            .await
            .json();

        let response = server
            .post(&format!("{INGREDIENTS}/save"))
            .add_header("authorization", auth)
            .json(&json!({"recipe_id": recipe.data.id, "name": "Flour", "quantity": "250", "position": 1}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created = response.json::<ApiResponse<IngredientResponse>>().data;
        assert_eq!(created.quantity, Decimal::new(250, 0));

        let updated: ApiResponse<IngredientResponse> = server
            .put(&format!("{INGREDIENTS}/update/{}", created.id))
            .add_header("authorization", auth)
            .json(&json!({"quantity": "275.5", "notes": "sifted"}))
            .await
            .json();
        assert_eq!(updated.data.quantity, Decimal::new(2755, 1));
        assert_eq!(updated.data.name, "Flour");
        assert_eq!(updated.data.notes.as_deref(), Some("sifted"));

        let for_recipe: ApiResponse<Vec<IngredientResponse>> = server
            .get(&format!("{INGREDIENTS}/list-all?recipe_id={}", recipe.data.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert_eq!(for_recipe.data.len(), 1);

        let response = server
            .post(&format!("{INGREDIENTS}/save"))
            .add_header("authorization", auth)
            .json(&json!({"recipe_id": recipe.data.id, "name": "Milk", "quantity": "0"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ApiResponse<ErrorBody>>().data.error, "ValidationError");

        // Ingredients of a missing recipe are a bad reference
        server
            .post(&format!("{INGREDIENTS}/save"))
            .add_header("authorization", auth)
            .json(&json!({"recipe_id": Uuid::new_v4(), "name": "Milk", "quantity": "1"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let deleted: ApiResponse<Deleted<Uuid>> = server
            .delete(&format!("{INGREDIENTS}/delete/{}", created.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert!(deleted.data.deleted);
        server
            .get(&format!("{INGREDIENTS}/detail/{}", created.id))
            .add_header("authorization", auth)
            .await
            .assert_status_not_found();
    }
}
