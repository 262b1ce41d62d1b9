//! # pantryctl: Control Layer for a Recipe, Product and Stock Catalog
//!
//! `pantryctl` is the admin backend for a kitchen catalog. It exposes a REST
//! API for managing recipes, products and their reference data, units of
//! measure, and stock held across warehouses.
//!
//! ## Overview
//!
//! Every resource follows the same CRUD surface under
//! `/api/<version>/admin/<module>/<resource>` (`list`, `list-all`,
//! `detail/{id}`, `save`, `update/{id}`, `delete/{id}`). A handful of
//! resources add domain operations on top: recipes link to categories,
//! products derive their selling price from margin levels, units convert
//! quantities through stored factors, and stock movements drive inventory
//! through a status lifecycle.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for all persistence.
//!
//! ### Request Flow
//!
//! A request first passes through CORS and tracing layers. Handlers extract a
//! [`auth::permissions::RequiresPermission`] guard, which validates the bearer
//! access token and checks the caller's role against the resource and
//! operation. Handlers then talk to the database through repositories in
//! [`db::handlers`] and wrap results in the [`api::models::response::ApiResponse`]
//! envelope. Errors flow back as [`errors::Error`], which renders the same
//! envelope with the right status code.
//!
//! ### Core Components
//!
//! - The **API layer** ([`api`]): handlers and request/response models
//! - The **authentication layer** ([`auth`]): access tokens, rotating refresh
//!   sessions, password hashing and role-based permissions
//! - The **database layer** ([`db`]): repositories over `&mut PgConnection`
//! - The **stock engine** ([`stock`]): pure inventory bookkeeping rules
//! - **Pricing** ([`pricing`]): margin arithmetic
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use pantryctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = pantryctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     pantryctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! pantryctl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod pricing;
pub mod stock;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::{handlers, models::users::Role},
    auth::password::{self, Argon2Params},
    config::CorsOrigin,
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
};
use axum::{
    Router,
    http::{self, HeaderValue},
    routing::{delete, get, post, put},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};

pub use types::{ProductId, RecipeId, StockMovementId, UserId, WarehouseId};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the pantryctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: an existing account keeps its id and only has its password
/// reset to the configured one. Returns the admin's user id.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: &str, config: &Config, db: &PgPool) -> anyhow::Result<UserId> {
    let email = email.trim().to_lowercase();
    let password_hash = password::hash_password(password.to_string(), Argon2Params::from(&config.auth.password)).await?;

    let mut tx = db.begin().await?;
    let mut users = Users::new(&mut tx);

    if let Some(existing) = users.get_user_by_email(&email).await? {
        users.set_password_by_email(&email, &password_hash).await?;
        tx.commit().await?;
        debug!("Initial admin user already exists, password refreshed");
        return Ok(existing.id);
    }

    let created = users
        .create(&UserCreateDBRequest {
            username: "admin".to_string(),
            email,
            password_hash,
            display_name: Some("Administrator".to_string()),
            role: Role::Admin,
            is_active: true,
        })
        .await?;

    tx.commit().await?;
    info!(user_id = %created.id, "Created initial admin user");
    Ok(created.id)
}

/// Connect to the database, run migrations, and create the initial admin
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .connect(&config.database.url)
        .await?;
    migrator().run(&pool).await?;

    match config.admin_password.as_deref() {
        Some(admin_password) => {
            create_initial_admin_user(&config.admin_email, admin_password, config, &pool).await?;
        }
        None => warn!("No admin_password configured, skipping initial admin user"),
    }

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // tower-http refuses `*` inside an origin list
    let allow_origin = if config.auth.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.auth.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout))
        .route("/logout-all", post(handlers::auth::logout_all))
        .route("/sessions", get(handlers::auth::sessions))
        .route("/me", get(handlers::auth::me))
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/users/list", get(users::list_users))
        .route("/users/list-all", get(users::list_all_users))
        .route("/users/detail/{id}", get(users::get_user))
        .route("/users/save", post(users::create_user))
        .route("/users/update/{id}", put(users::update_user))
        .route("/users/delete/{id}", delete(users::delete_user))
}

fn recipe_routes() -> Router<AppState> {
    use handlers::{ingredients, recipe_categories, recipes, steps};

    Router::new()
        // Recipes
        .route("/recipes/list", get(recipes::list_recipes))
        .route("/recipes/list-all", get(recipes::list_all_recipes))
        .route("/recipes/detail/{id}", get(recipes::get_recipe))
        .route("/recipes/save", post(recipes::create_recipe))
        .route("/recipes/update/{id}", put(recipes::update_recipe))
        .route("/recipes/delete/{id}", delete(recipes::delete_recipe))
        .route(
            "/recipes/{id}/categories/{category_id}",
            post(recipes::link_category).delete(recipes::unlink_category),
        )
        // Categories
        .route("/categories/list", get(recipe_categories::list_categories))
        .route("/categories/list-all", get(recipe_categories::list_all_categories))
        .route("/categories/detail/{id}", get(recipe_categories::get_category))
        .route("/categories/save", post(recipe_categories::create_category))
        .route("/categories/update/{id}", put(recipe_categories::update_category))
        .route("/categories/delete/{id}", delete(recipe_categories::delete_category))
        // Ingredients
        .route("/ingredients/list", get(ingredients::list_ingredients))
        .route("/ingredients/list-all", get(ingredients::list_all_ingredients))
        .route("/ingredients/detail/{id}", get(ingredients::get_ingredient))
        .route("/ingredients/save", post(ingredients::create_ingredient))
        .route("/ingredients/update/{id}", put(ingredients::update_ingredient))
        .route("/ingredients/delete/{id}", delete(ingredients::delete_ingredient))
        // Steps
        .route("/steps/list", get(steps::list_steps))
        .route("/steps/list-all", get(steps::list_all_steps))
        .route("/steps/detail/{id}", get(steps::get_step))
        .route("/steps/save", post(steps::create_step))
        .route("/steps/update/{id}", put(steps::update_step))
        .route("/steps/delete/{id}", delete(steps::delete_step))
}

fn product_routes() -> Router<AppState> {
    use handlers::{margins, origins, product_categories, product_subcategories, products, suppliers};

    Router::new()
        // Products
        .route("/products/list", get(products::list_products))
        .route("/products/list-all", get(products::list_all_products))
        .route("/products/detail/{id}", get(products::get_product))
        .route("/products/save", post(products::create_product))
        .route("/products/update/{id}", put(products::update_product))
        .route("/products/delete/{id}", delete(products::delete_product))
        // Categories
        .route("/categories/list", get(product_categories::list_categories))
        .route("/categories/list-all", get(product_categories::list_all_categories))
        .route("/categories/detail/{id}", get(product_categories::get_category))
        .route("/categories/save", post(product_categories::create_category))
        .route("/categories/update/{id}", put(product_categories::update_category))
        .route("/categories/delete/{id}", delete(product_categories::delete_category))
        // Subcategories
        .route("/subcategories/list", get(product_subcategories::list_subcategories))
        .route("/subcategories/list-all", get(product_subcategories::list_all_subcategories))
        .route("/subcategories/detail/{id}", get(product_subcategories::get_subcategory))
        .route("/subcategories/save", post(product_subcategories::create_subcategory))
        .route("/subcategories/update/{id}", put(product_subcategories::update_subcategory))
        .route("/subcategories/delete/{id}", delete(product_subcategories::delete_subcategory))
        // Suppliers
        .route("/suppliers/list", get(suppliers::list_suppliers))
        .route("/suppliers/list-all", get(suppliers::list_all_suppliers))
        .route("/suppliers/detail/{id}", get(suppliers::get_supplier))
        .route("/suppliers/save", post(suppliers::create_supplier))
        .route("/suppliers/update/{id}", put(suppliers::update_supplier))
        .route("/suppliers/delete/{id}", delete(suppliers::delete_supplier))
        // Origins
        .route("/origins/list", get(origins::list_origins))
        .route("/origins/list-all", get(origins::list_all_origins))
        .route("/origins/detail/{id}", get(origins::get_origin))
        .route("/origins/save", post(origins::create_origin))
        .route("/origins/update/{id}", put(origins::update_origin))
        .route("/origins/delete/{id}", delete(origins::delete_origin))
        // Margin levels
        .route("/margins/list", get(margins::list_margins))
        .route("/margins/list-all", get(margins::list_all_margins))
        .route("/margins/detail/{id}", get(margins::get_margin))
        .route("/margins/save", post(margins::create_margin))
        .route("/margins/update/{id}", put(margins::update_margin))
        .route("/margins/delete/{id}", delete(margins::delete_margin))
        .route("/margins/{id}/apply", get(margins::apply_margin))
}

fn unit_routes() -> Router<AppState> {
    use handlers::{units, volume_conversions};

    Router::new()
        .route("/units/list", get(units::list_units))
        .route("/units/list-all", get(units::list_all_units))
        .route("/units/detail/{id}", get(units::get_unit))
        .route("/units/save", post(units::create_unit))
        .route("/units/update/{id}", put(units::update_unit))
        .route("/units/delete/{id}", delete(units::delete_unit))
        .route("/volume-conversions/list", get(volume_conversions::list_conversions))
        .route("/volume-conversions/list-all", get(volume_conversions::list_all_conversions))
        .route("/volume-conversions/detail/{id}", get(volume_conversions::get_conversion))
        .route("/volume-conversions/save", post(volume_conversions::create_conversion))
        .route("/volume-conversions/update/{id}", put(volume_conversions::update_conversion))
        .route("/volume-conversions/delete/{id}", delete(volume_conversions::delete_conversion))
        .route("/volume-conversions/convert", post(volume_conversions::convert))
}

fn stock_routes() -> Router<AppState> {
    use handlers::{inventories, movements, warehouses};

    Router::new()
        // Warehouses
        .route("/warehouses/list", get(warehouses::list_warehouses))
        .route("/warehouses/list-all", get(warehouses::list_all_warehouses))
        .route("/warehouses/detail/{id}", get(warehouses::get_warehouse))
        .route("/warehouses/save", post(warehouses::create_warehouse))
        .route("/warehouses/update/{id}", put(warehouses::update_warehouse))
        .route("/warehouses/delete/{id}", delete(warehouses::delete_warehouse))
        // Inventories
        .route("/inventories/list", get(inventories::list_inventories))
        .route("/inventories/list-all", get(inventories::list_all_inventories))
        .route("/inventories/detail/{id}", get(inventories::get_inventory))
        .route("/inventories/save", post(inventories::create_inventory))
        .route("/inventories/update/{id}", put(inventories::update_inventory))
        .route("/inventories/delete/{id}", delete(inventories::delete_inventory))
        .route("/inventories/low-stock", get(inventories::low_stock))
        .route("/inventories/summary", get(inventories::summary))
        .route("/inventories/{id}/reserve", post(inventories::reserve))
        .route("/inventories/{id}/release", post(inventories::release))
        // Movements
        .route("/movements/list", get(movements::list_movements))
        .route("/movements/list-all", get(movements::list_all_movements))
        .route("/movements/detail/{id}", get(movements::get_movement))
        .route("/movements/save", post(movements::create_movement))
        .route("/movements/update/{id}", put(movements::update_movement))
        .route("/movements/delete/{id}", delete(movements::delete_movement))
        .route("/movements/status/{id}", put(movements::update_status))
}

/// Build the main application router with all endpoints and middleware.
///
/// Auth routes live under `<api_prefix>/auth`, catalog routes under
/// `<api_prefix>/admin/<module>`. CORS and HTTP tracing wrap everything.
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_prefix = state.config.api_prefix();

    let admin_routes = Router::new()
        .nest("/users", user_routes())
        .nest("/recipes", recipe_routes())
        .nest("/products", product_routes())
        .nest("/units", unit_routes())
        .nest("/stock", stock_routes());

    let api_routes = Router::new().nest("/auth", auth_routes()).nest("/admin", admin_routes);

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest(&api_prefix, api_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors_layer),
        );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting pantry control layer with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Pantry control layer listening on http://{}, API at {}",
            bind_addr,
            self.config.api_prefix()
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
