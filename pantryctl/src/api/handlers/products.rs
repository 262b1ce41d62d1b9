use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            products::{ProductCreate, ProductResponse, ProductUpdate},
            response::{ApiResponse, Deleted},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Products, Repository, products::PRODUCT_FILTERS},
        models::products::{ProductCreateDBRequest, ProductUpdateDBRequest},
    },
    errors::{Error, Result},
    types::ProductId,
};

#[tracing::instrument(skip_all)]
pub async fn list_products(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<ProductResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut Products::new(&mut conn), &query, PRODUCT_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(ProductResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_products(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<ProductResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let products = crud::list_all(&mut Products::new(&mut conn), &query, PRODUCT_FILTERS).await?;
    Ok(ApiResponse::ok(products.into_iter().map(ProductResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_product(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Path(id): Path<ProductId>,
) -> Result<ApiResponse<ProductResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let product = Products::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(product, "Product", id)?.into()))
}

/// Create a product. With a margin level the selling price is derived from cost.
#[tracing::instrument(skip_all)]
pub async fn create_product(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Create>,
    Json(body): Json<ProductCreate>,
) -> Result<ApiResponse<ProductResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let product = Products::new(&mut conn).create(&ProductCreateDBRequest::from(body)).await?;
    tracing::info!(product_id = %product.id, sku = %product.sku, "Created product");
    Ok(ApiResponse::created(product.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_product(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Update>,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductUpdate>,
) -> Result<ApiResponse<ProductResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let product = Products::new(&mut conn).update(id, &ProductUpdateDBRequest::from(body)).await?;
    Ok(ApiResponse::ok(product.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_product(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Delete>,
    Path(id): Path<ProductId>,
) -> Result<ApiResponse<Deleted<ProductId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Products::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Product", id)?))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            pagination::PaginatedResponse,
            products::{MarginLevelResponse, ProductCategoryResponse, ProductResponse, ProductSubcategoryResponse},
            response::{ApiResponse, ErrorBody},
            users::Role,
        },
        test_utils::{create_test_server, login_as},
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sqlx::PgPool;

    const PRODUCTS: &str = "/api/v1/admin/products/products";

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    async fn create_category(server: &TestServer, auth: &str, name: &str) -> ProductCategoryResponse {
        let response = server
            .post("/api/v1/admin/products/categories/save")
            .add_header("authorization", auth)
            .json(&json!({"name": name}))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<ApiResponse<ProductCategoryResponse>>().data
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_margin_prices_product_and_reprices_on_update(pool: PgPool) {
        let (_, manager) = login_as(&pool, Role::Manager).await;
        let server = create_test_server(pool);
        let auth = manager.as_str();

        let category = create_category(&server, auth, "Oils").await;
        let margin: ApiResponse<MarginLevelResponse> = server
            .post("/api/v1/admin/products/margins/save")
            .add_header("authorization", auth)
            .json(&json!({"name": "Standard", "percentage": "25"}))
            .await
            .json();

        let response = server
            .post(&format!("{PRODUCTS}/save"))
            .add_header("authorization", auth)
            .json(&json!({
                "name": "Olive oil",
                "sku": "OIL-001",
                "category_id": category.id,
                "margin_level_id": margin.data.id,
                "cost_price": "10.00",
                "selling_price": "99.00",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let product = response.json::<ApiResponse<ProductResponse>>().data;
        assert_eq!(product.selling_price, dec("12.50"));

        server
            .put(&format!("/api/v1/admin/products/margins/update/{}", margin.data.id))
            .add_header("authorization", auth)
            .json(&json!({"percentage": "40"}))
            .await
            .assert_status_ok();

        let repriced: ApiResponse<ProductResponse> = server
            .get(&format!("{PRODUCTS}/detail/{}", product.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert_eq!(repriced.data.selling_price, dec("14.00"));

        // An explicit null takes the product off the margin level
        let response = server
            .put(&format!("{PRODUCTS}/update/{}", product.id))
            .add_header("authorization", auth)
            .json(&json!({"margin_level_id": null, "selling_price": "15.00"}))
            .await;
        response.assert_status_ok();
        let detached = response.json::<ApiResponse<ProductResponse>>().data;
        assert_eq!(detached.margin_level_id, None);
        assert_eq!(detached.selling_price, dec("15.00"));

        server
            .put(&format!("/api/v1/admin/products/margins/update/{}", margin.data.id))
            .add_header("authorization", auth)
            .json(&json!({"percentage": "10"}))
            .await
            .assert_status_ok();
        let unchanged: ApiResponse<ProductResponse> = server
            .get(&format!("{PRODUCTS}/detail/{}", product.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert_eq!(unchanged.data.selling_price, dec("15.00"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_selling_price_defaults_to_cost(pool: PgPool) {
        let (_, manager) = login_as(&pool, Role::Manager).await;
        let server = create_test_server(pool);
        let category = create_category(&server, manager.as_str(), "Grains").await;

        let product: ApiResponse<ProductResponse> = server
            .post(&format!("{PRODUCTS}/save"))
            .add_header("authorization", manager.as_str())
            .json(&json!({"name": "Rice", "sku": "RICE-1", "category_id": category.id, "cost_price": "3.20"}))
            .await
            .json();
        assert_eq!(product.data.selling_price, dec("3.20"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_sku_and_foreign_subcategory(pool: PgPool) {
        let (_, manager) = login_as(&pool, Role::Manager).await;
        let server = create_test_server(pool);
        let auth = manager.as_str();

        let dairy = create_category(&server, auth, "Dairy").await;
        let bakery = create_category(&server, auth, "Bakery").await;
        let cheese: ApiResponse<ProductSubcategoryResponse> = server
            .post("/api/v1/admin/products/subcategories/save")
            .add_header("authorization", auth)
            .json(&json!({"category_id": dairy.id, "name": "Cheese"}))
            .await
            .json();

        let body = json!({"name": "Brie", "sku": "CHS-1", "category_id": dairy.id, "subcategory_id": cheese.data.id});
        server
            .post(&format!("{PRODUCTS}/save"))
            .add_header("authorization", auth)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post(&format!("{PRODUCTS}/save")).add_header("authorization", auth).json(&body).await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(
            response.json::<ApiResponse<ErrorBody>>().data.message,
            "A product with this SKU already exists"
        );

        server
            .post(&format!("{PRODUCTS}/save"))
            .add_header("authorization", auth)
            .json(&json!({"name": "Baguette", "sku": "BRD-1", "category_id": bakery.id, "subcategory_id": cheese.data.id}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let page: ApiResponse<PaginatedResponse<ProductResponse>> = server
            .get(&format!("{PRODUCTS}/list?category_id={}&limit=5", dairy.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert_eq!(page.data.total_count, 1);
        assert_eq!(page.data.limit, 5);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_staff_cannot_create_products(pool: PgPool) {
        let (_, staff) = login_as(&pool, Role::Staff).await;
        let server = create_test_server(pool);

        let response = server
            .post(&format!("{PRODUCTS}/save"))
            .add_header("authorization", staff.as_str())
            .json(&json!({"name": "Salt", "sku": "SALT", "category_id": uuid::Uuid::new_v4()}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.json::<ApiResponse<ErrorBody>>().data.error, "Forbidden");

        server
            .get(&format!("{PRODUCTS}/list-all"))
            .add_header("authorization", staff.as_str())
            .await
            .assert_status_ok();
    }
}
