//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` and implements the
//! [`Repository`] trait for the entity it owns. Because a transaction
//! dereferences to a connection, callers decide whether a repository runs on a
//! pooled connection or inside a wider transaction.
//!
//! # Available Repositories
//!
//! - [`Users`] and [`TokenFamilies`]: accounts and login sessions
//! - [`Recipes`], [`RecipeCategories`], [`Ingredients`], [`Steps`]
//! - [`Products`], [`ProductCategories`], [`ProductSubcategories`],
//!   [`Suppliers`], [`Origins`], [`MarginLevels`]
//! - [`Units`], [`VolumeConversions`]
//! - [`Warehouses`], [`Inventories`], [`StockMovements`]
//!
//! # Common Pattern
//!
//! ```ignore
//! use pantryctl::db::handlers::{Products, Repository, filters::ListFilter};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Products::new(&mut tx);
//!     let products = repo.list(&ListFilter::new(0, 10)).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```
//!
//! List endpoints only accept the filter parameters a repository publishes in
//! its `*_FILTERS` allow-list; see [`filters`].

pub mod filters;
pub mod ingredients;
pub mod inventories;
pub mod margin_levels;
pub mod origins;
pub mod product_categories;
pub mod product_subcategories;
pub mod products;
pub mod recipe_categories;
pub mod recipes;
pub mod repository;
pub mod steps;
pub mod stock_movements;
pub mod suppliers;
pub mod token_families;
pub mod units;
pub mod users;
pub mod volume_conversions;
pub mod warehouses;

pub use ingredients::Ingredients;
pub use inventories::Inventories;
pub use margin_levels::MarginLevels;
pub use origins::Origins;
pub use product_categories::ProductCategories;
pub use product_subcategories::ProductSubcategories;
pub use products::Products;
pub use recipe_categories::RecipeCategories;
pub use recipes::Recipes;
pub use repository::Repository;
pub use steps::Steps;
pub use stock_movements::StockMovements;
pub use suppliers::Suppliers;
pub use token_families::TokenFamilies;
pub use units::Units;
pub use users::Users;
pub use volume_conversions::VolumeConversions;
pub use warehouses::Warehouses;
