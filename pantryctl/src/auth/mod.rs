//! Authentication and authorization.
//!
//! # Authentication
//!
//! Clients log in at `/auth/login` with an email address or username and a
//! password, and receive two tokens:
//!
//! - a short-lived **access token** (HS256 JWT) sent as `Authorization: Bearer <jwt>`
//! - a long-lived **refresh token** that is exchanged at `/auth/refresh` for a new pair
//!
//! Refresh tokens rotate inside a token family, one family per login session.
//! See [`session_service`] for the rotation and reuse rules.
//!
//! # Authorization
//!
//! Each user has a single role. [`permissions::role_allows`] decides which
//! operations a role may perform on which resource, and
//! [`permissions::RequiresPermission`] enforces it per handler.
//!
//! # Modules
//!
//! - [`current_user`]: Bearer token extractor for the authenticated user
//! - [`password`]: Argon2 password hashing and refresh-token secrets
//! - [`permissions`]: Role grants and the permission extractor
//! - [`session`]: Access token signing and verification
//! - [`session_service`]: Login, refresh, logout and session listing
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use pantryctl::auth::permissions::{RequiresPermission, operation, resource};
//!
//! async fn delete_warehouse(
//!     State(state): State<AppState>,
//!     current_user: RequiresPermission<resource::Stock, operation::Delete>,
//!     Path(id): Path<WarehouseId>,
//! ) -> Result<ApiResponse<Deleted<WarehouseId>>, Error> {
//!     tracing::info!(user = %current_user.username, "deleting warehouse");
//!     ...
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
pub mod session_service;
