//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database models,
//!   allowing independent evolution of API and storage representations
//! - **Validation**: Create/update models carry a `validate()` with the direct
//!   field checks handlers run before touching the database
//! - **Envelope**: Every body is wrapped in [`response::ApiResponse`]
//!
//! # Model Categories
//!
//! - [`users`]: User accounts, roles and the authenticated caller
//! - [`auth`]: Login, refresh and session payloads
//! - [`recipes`]: Recipes, recipe categories, ingredients and steps
//! - [`products`]: Products and their reference data
//! - [`units`]: Units of measure and volume conversions
//! - [`stock`]: Warehouses, inventories and stock movements
//! - [`pagination`]: List query parameters and paginated bodies
//! - [`response`]: The response envelope

pub mod auth;
pub mod pagination;
pub mod products;
pub mod recipes;
pub mod response;
pub mod stock;
pub mod units;
pub mod users;
