//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows. These models are used by repositories to return query results
//! and accept insertion/update data.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each `*DBResponse` struct matches a database table row
//! - **SQLx Integration**: Responses derive `sqlx::FromRow` for query results
//! - **Separation**: Database models are distinct from API models to allow
//!   independent evolution of storage and API representations
//! - **Partial updates**: `*UpdateDBRequest` fields left as `None` keep their stored value
//!
//! # Model Categories
//!
//! - [`users`]: User accounts and roles
//! - [`token_families`]: Login sessions and their rotating refresh tokens
//! - [`recipes`]: Recipes, recipe categories, ingredients and steps
//! - [`products`]: Products, categories, subcategories, suppliers, origins and margin levels
//! - [`units`]: Units of measure and volume conversions
//! - [`stock`]: Warehouses, inventories and stock movements
//!
//! # Conversion to API Models
//!
//! Database models implement `From` conversions to API models:
//!
//! ```ignore
//! use pantryctl::db::models::users::UserDBResponse;
//! use pantryctl::api::models::users::UserResponse;
//!
//! let db_user: UserDBResponse = /* ... */;
//! let api_response: UserResponse = db_user.into();
//! ```

pub mod products;
pub mod recipes;
pub mod stock;
pub mod token_families;
pub mod units;
pub mod users;
