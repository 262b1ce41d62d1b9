use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            products::{ProductSubcategoryCreate, ProductSubcategoryResponse, ProductSubcategoryUpdate},
            response::{ApiResponse, Deleted},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{ProductSubcategories, Repository, product_subcategories::PRODUCT_SUBCATEGORY_FILTERS},
        models::products::{ProductSubcategoryCreateDBRequest, ProductSubcategoryUpdateDBRequest},
    },
    errors::{Error, Result},
    types::ProductSubcategoryId,
};

#[tracing::instrument(skip_all)]
pub async fn list_subcategories(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<ProductSubcategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut ProductSubcategories::new(&mut conn), &query, PRODUCT_SUBCATEGORY_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(ProductSubcategoryResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_subcategories(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<ProductSubcategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subcategories = crud::list_all(&mut ProductSubcategories::new(&mut conn), &query, PRODUCT_SUBCATEGORY_FILTERS).await?;
    Ok(ApiResponse::ok(subcategories.into_iter().map(ProductSubcategoryResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_subcategory(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Path(id): Path<ProductSubcategoryId>,
) -> Result<ApiResponse<ProductSubcategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subcategory = ProductSubcategories::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(subcategory, "Product subcategory", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_subcategory(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Create>,
    Json(body): Json<ProductSubcategoryCreate>,
) -> Result<ApiResponse<ProductSubcategoryResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subcategory = ProductSubcategories::new(&mut conn)
        .create(&ProductSubcategoryCreateDBRequest::from(body))
        .await?;
    Ok(ApiResponse::created(subcategory.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_subcategory(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Update>,
    Path(id): Path<ProductSubcategoryId>,
    Json(body): Json<ProductSubcategoryUpdate>,
) -> Result<ApiResponse<ProductSubcategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subcategory = ProductSubcategories::new(&mut conn)
        .update(id, &ProductSubcategoryUpdateDBRequest::from(body))
        .await?;
    Ok(ApiResponse::ok(subcategory.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_subcategory(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Delete>,
    Path(id): Path<ProductSubcategoryId>,
) -> Result<ApiResponse<Deleted<ProductSubcategoryId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = ProductSubcategories::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Product subcategory", id)?))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            products::{ProductCategoryResponse, ProductSubcategoryResponse},
            response::{ApiResponse, Deleted, ErrorBody},
            users::Role,
        },
        test_utils::{create_test_server, login_as},
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::PgPool;
    use uuid::Uuid;

    const SUBCATEGORIES: &str = "/api/v1/admin/products/subcategories";

    async fn category(server: &TestServer, auth: &str, name: &str) -> ProductCategoryResponse {
        server
            .post("/api/v1/admin/products/categories/save")
            .add_header("authorization", auth)
            .json(&json!({"name": name}))
            .await
            .json::<ApiResponse<ProductCategoryResponse>>()
            .data
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_product_subcategory_crud_round_trip(pool: PgPool) {
        let (_, manager) = login_as(&pool, Role::Manager).await;
        let server = create_test_server(pool);
        let auth = manager.as_str();
        let dairy = category(&server, auth, "Dairy").await;
        let bakery = category(&server, auth, "Bakery").await;

        let response = server
            .post(&format!("{SUBCATEGORIES}/save"))
            .add_header("authorization", auth)
            .json(&json!({"category_id": dairy.id, "name": "Soft cheese"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created = response.json::<ApiResponse<ProductSubcategoryResponse>>().data;
        assert_eq!(created.category_id, dairy.id);

        // Names are unique within a category only
        let response = server
            .post(&format!("{SUBCATEGORIES}/save"))
            .add_header("authorization", auth)
            .json(&json!({"category_id": dairy.id, "name": "Soft cheese"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(
            response.json::<ApiResponse<ErrorBody>>().data.message,
            "A record with this name already exists"
        );
        server
            .post(&format!("{SUBCATEGORIES}/save"))
            .add_header("authorization", auth)
            .json(&json!({"category_id": bakery.id, "name": "Soft cheese"}))
            .await
            .assert_status(StatusCode::CREATED);

        let updated: ApiResponse<ProductSubcategoryResponse> = server
            .put(&format!("{SUBCATEGORIES}/update/{}", created.id))
            .add_header("authorization", auth)
            .json(&json!({"name": "Fresh cheese"}))
            .await
            .json();
        assert_eq!(updated.data.name, "Fresh cheese");

        let in_dairy: ApiResponse<Vec<ProductSubcategoryResponse>> = server
            .get(&format!("{SUBCATEGORIES}/list-all?category_id={}", dairy.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert_eq!(in_dairy.data.len(), 1);

        // Unknown parent category is a bad reference
        server
            .post(&format!("{SUBCATEGORIES}/save"))
            .add_header("authorization", auth)
            .json(&json!({"category_id": Uuid::new_v4(), "name": "Orphan"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let deleted: ApiResponse<Deleted<Uuid>> = server
            .delete(&format!("{SUBCATEGORIES}/delete/{}", created.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert!(deleted.data.deleted);
        server
            .get(&format!("{SUBCATEGORIES}/detail/{}", created.id))
            .add_header("authorization", auth)
            .await
            .assert_status_not_found();
    }
}
