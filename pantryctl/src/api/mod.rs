//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//! - **[`extract`]**: `Json`, `Query` and `Path` extractors that reject with the error envelope
//!
//! # API Structure
//!
//! All routes live under `/api/<version>` (`/api/v1` by default):
//!
//! - **Authentication** (`/auth/*`): Login, token refresh, logout, sessions
//! - **Users** (`/admin/users/users/*`): Account administration
//! - **Recipes** (`/admin/recipes/*`): Recipes, categories, ingredients, steps
//! - **Products** (`/admin/products/*`): Products, categories, subcategories,
//!   suppliers, origins, margin levels
//! - **Units** (`/admin/units/*`): Units of measure and volume conversions
//! - **Stock** (`/admin/stock/*`): Warehouses, inventories, stock movements
//!
//! Every admin resource exposes `list`, `list-all`, `detail/{id}`, `save`,
//! `update/{id}` and `delete/{id}`.

pub mod extract;
pub mod handlers;
pub mod models;
