use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            products::{ProductCategoryCreate, ProductCategoryResponse, ProductCategoryUpdate},
            response::{ApiResponse, Deleted},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{ProductCategories, Repository, product_categories::PRODUCT_CATEGORY_FILTERS},
        models::products::{ProductCategoryCreateDBRequest, ProductCategoryUpdateDBRequest},
    },
    errors::{Error, Result},
    types::ProductCategoryId,
};

#[tracing::instrument(skip_all)]
pub async fn list_categories(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<ProductCategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut ProductCategories::new(&mut conn), &query, PRODUCT_CATEGORY_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(ProductCategoryResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_categories(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<ProductCategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let categories = crud::list_all(&mut ProductCategories::new(&mut conn), &query, PRODUCT_CATEGORY_FILTERS).await?;
    Ok(ApiResponse::ok(categories.into_iter().map(ProductCategoryResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Path(id): Path<ProductCategoryId>,
) -> Result<ApiResponse<ProductCategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = ProductCategories::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(category, "Product category", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Create>,
    Json(body): Json<ProductCategoryCreate>,
) -> Result<ApiResponse<ProductCategoryResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = ProductCategories::new(&mut conn)
        .create(&ProductCategoryCreateDBRequest::from(body))
        .await?;
    Ok(ApiResponse::created(category.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Update>,
    Path(id): Path<ProductCategoryId>,
    Json(body): Json<ProductCategoryUpdate>,
) -> Result<ApiResponse<ProductCategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = ProductCategories::new(&mut conn)
        .update(id, &ProductCategoryUpdateDBRequest::from(body))
        .await?;
    Ok(ApiResponse::ok(category.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Delete>,
    Path(id): Path<ProductCategoryId>,
) -> Result<ApiResponse<Deleted<ProductCategoryId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = ProductCategories::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Product category", id)?))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            products::ProductCategoryResponse,
            response::{ApiResponse, Deleted, ErrorBody},
            users::Role,
        },
        test_utils::{create_test_server, login_as},
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;
    use uuid::Uuid;

    const CATEGORIES: &str = "/api/v1/admin/products/categories";

    #[sqlx::test]
    #[test_log::test]
    async fn test_product_category_crud_round_trip(pool: PgPool) {
        let (_, manager) = login_as(&pool, Role::Manager).await;
        let server = create_test_server(pool);
        let auth = manager.as_str();

        let response = server
            .post(&format!("{CATEGORIES}/save"))
            .add_header("authorization", auth)
            .json(&json!({"name": "Dairy"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created = response.json::<ApiResponse<ProductCategoryResponse>>().data;

        let updated: ApiResponse<ProductCategoryResponse> = server
            .put(&format!("{CATEGORIES}/update/{}", created.id))
            .add_header("authorization", auth)
            .json(&json!({"description": "Milk, cheese and butter"}))
            .await
            .json();
        assert_eq!(updated.data.name, "Dairy");
        assert_eq!(updated.data.description.as_deref(), Some("Milk, cheese and butter"));

        let fetched: ApiResponse<ProductCategoryResponse> = server
            .get(&format!("{CATEGORIES}/detail/{}", created.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert_eq!(fetched.data.description, updated.data.description);

        let response = server
            .post(&format!("{CATEGORIES}/save"))
            .add_header("authorization", auth)
            .json(&json!({"name": "Dairy"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<ApiResponse<ErrorBody>>().data.error, "Conflict");

        server
            .post(&format!("{CATEGORIES}/save"))
            .add_header("authorization", auth)
            .json(&json!({"name": "   "}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let deleted: ApiResponse<Deleted<Uuid>> = server
            .delete(&format!("{CATEGORIES}/delete/{}", created.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert_eq!(deleted.data.id, created.id);
        server
            .get(&format!("{CATEGORIES}/detail/{}", created.id))
            .add_header("authorization", auth)
            .await
            .assert_status_not_found();
    }
}
