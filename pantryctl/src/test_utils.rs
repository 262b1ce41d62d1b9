//! Fixtures shared by the unit and handler tests.

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role, UserResponse},
    auth::{
        password::{self, Argon2Params},
        session,
    },
    config::{Config, PasswordConfig},
    db::{
        handlers::{ProductCategories, Products, Repository, TokenFamilies, Users, Warehouses},
        models::{
            products::{ProductCategoryCreateDBRequest, ProductCreateDBRequest, ProductDBResponse},
            stock::{WarehouseCreateDBRequest, WarehouseDBResponse},
            users::UserCreateDBRequest,
        },
    },
};
use axum_test::TestServer;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key-for-pantryctl".to_string()),
        ..Default::default()
    };
    // Cheap hashing keeps the suite fast
    config.auth.password = PasswordConfig {
        argon2_memory_kib: 128,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Default::default()
    };
    config
}

pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::builder().db(pool).config(create_test_config()).build()
}

/// A server over the full router, with the same routes and layers as production.
pub fn create_test_server(pool: PgPool) -> TestServer {
    let router = crate::build_router(create_test_state(pool)).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> UserResponse {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    let password_hash = password::hash_string_with_params(TEST_PASSWORD, Argon2Params::from(&create_test_config().auth.password))
        .expect("Failed to hash test password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: format!("{}_{suffix}", role.to_string().to_lowercase()),
            email: format!("{}_{suffix}@pantry.test", role.to_string().to_lowercase()),
            password_hash,
            display_name: None,
            role,
            is_active: true,
        })
        .await
        .expect("Failed to create test user");

    UserResponse::from(user)
}

/// `Authorization` header value carrying a fresh access token for `user`.
pub async fn bearer_for(pool: &PgPool, user: &UserResponse) -> String {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let family = TokenFamilies::new(&mut conn)
        .create_family(user.id, Some("pantry-tests"))
        .await
        .expect("Failed to open test session");
    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        session_id: family.id,
    };
    let token = session::create_access_token(&current, &create_test_config()).expect("Failed to sign access token");
    format!("Bearer {token}")
}

/// Create a user with `role` and return the header to authenticate as them.
pub async fn login_as(pool: &PgPool, role: Role) -> (UserResponse, String) {
    let user = create_test_user(pool, role).await;
    let header = bearer_for(pool, &user).await;
    (user, header)
}

pub async fn create_test_product(pool: &PgPool, sku: &str) -> ProductDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let category = ProductCategories::new(&mut conn)
        .create(&ProductCategoryCreateDBRequest {
            name: format!("Category {sku}"),
            description: None,
        })
        .await
        .expect("Failed to create product category");

    Products::new(&mut conn)
        .create(&ProductCreateDBRequest {
            name: format!("Product {sku}"),
            sku: sku.to_string(),
            description: None,
            category_id: category.id,
            subcategory_id: None,
            supplier_id: None,
            origin_id: None,
            margin_level_id: None,
            unit_id: None,
            cost_price: Decimal::new(250, 2),
            selling_price: None,
            is_active: true,
        })
        .await
        .expect("Failed to create test product")
}

pub async fn create_test_warehouse(pool: &PgPool, code: &str) -> WarehouseDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Warehouses::new(&mut conn)
        .create(&WarehouseCreateDBRequest {
            name: format!("Warehouse {code}"),
            code: code.to_string(),
            address: None,
            is_active: true,
        })
        .await
        .expect("Failed to create test warehouse")
}
