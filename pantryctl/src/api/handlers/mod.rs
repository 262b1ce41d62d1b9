//! HTTP request handlers for all API endpoints.
//!
//! Handlers are organized by resource type, one module per resource. Each
//! handler:
//! - Extracts a [`crate::auth::permissions::RequiresPermission`] guard
//! - Runs the model's `validate()` on create/update bodies
//! - Calls into a repository from [`crate::db::handlers`]
//! - Wraps the result in [`crate::api::models::response::ApiResponse`]
//!
//! # Handler Modules
//!
//! - [`auth`]: Login, refresh-token rotation, logout and session listing
//! - [`users`]: User administration
//! - [`recipes`], [`recipe_categories`], [`ingredients`], [`steps`]: Recipe catalog
//! - [`products`], [`product_categories`], [`product_subcategories`],
//!   [`suppliers`], [`origins`], [`margins`]: Product catalog and pricing
//! - [`units`], [`volume_conversions`]: Units of measure and conversion
//! - [`warehouses`], [`inventories`], [`movements`]: Stock
//!
//! [`crud`] holds the list/detail/delete plumbing shared by all of them.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts to the
//! appropriate HTTP status code and the JSON error envelope.

pub mod auth;
pub mod crud;
pub mod ingredients;
pub mod inventories;
pub mod margins;
pub mod movements;
pub mod origins;
pub mod product_categories;
pub mod product_subcategories;
pub mod products;
pub mod recipe_categories;
pub mod recipes;
pub mod steps;
pub mod suppliers;
pub mod units;
pub mod users;
pub mod volume_conversions;
pub mod warehouses;
