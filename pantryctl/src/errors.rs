use crate::api::models::response::{ApiResponse, ErrorBody};
use crate::db::errors::DbError;
use crate::types::{Operation, Resource};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided, or credentials rejected
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Bearer token could not be decoded or its signature is wrong
    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    /// Bearer or refresh token is past its expiry
    #[error("Token expired")]
    TokenExpired,

    /// User's role lacks the permission for the operation
    #[error("Insufficient permissions to {action} {resource}")]
    InsufficientPermissions { action: Operation, resource: Resource },

    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Well-formed request that breaks a business rule
    #[error("{message}")]
    Unprocessable { message: String },

    /// Conflict with existing data
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } | Error::InvalidToken { .. } | Error::TokenExpired => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } | DbError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
                DbError::Stock(_) | DbError::RuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classification name reported to clients in the error envelope
    pub fn name(&self) -> &'static str {
        match self {
            Error::Unauthenticated { .. } => "UnauthorizedError",
            Error::InvalidToken { .. } => "JsonWebTokenError",
            Error::TokenExpired => "TokenExpiredError",
            Error::InsufficientPermissions { .. } => "Forbidden",
            Error::BadRequest { .. } => "ValidationError",
            Error::NotFound { .. } => "NotFound",
            Error::Unprocessable { .. } => "Unprocessable",
            Error::Conflict { .. } => "Conflict",
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "NotFound",
                DbError::UniqueViolation { .. } => "Conflict",
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } | DbError::InvalidValue { .. } => {
                    "ValidationError"
                }
                DbError::Stock(_) | DbError::RuleViolation { .. } => "Unprocessable",
                DbError::Other(_) => "InternalServerError",
            },
            Error::Internal { .. } | Error::Other(_) => "InternalServerError",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InvalidToken { .. } => "Invalid token".to_string(),
            Error::TokenExpired => "Token has expired".to_string(),
            Error::InsufficientPermissions { action, resource } => {
                format!("Insufficient permissions to {action} {resource}")
            }
            Error::BadRequest { message } | Error::Unprocessable { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Conflict { message } => message.clone(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => unique_violation_message(table.as_deref(), constraint.as_deref()),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Stock(err) => err.to_string(),
                DbError::RuleViolation { message } | DbError::InvalidValue { message } => message.clone(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
        }
    }
}

/// User-facing messages for unique constraints, keyed by table and constraint name
fn unique_violation_message(table: Option<&str>, constraint: Option<&str>) -> String {
    let message = match (table, constraint) {
        (Some("users"), Some(c)) if c.contains("email") => "An account with this email address already exists",
        (Some("users"), Some(c)) if c.contains("username") => "This username is already taken",
        (Some("products"), Some("products_sku_unique")) => "A product with this SKU already exists",
        (Some("steps"), Some("steps_position_unique")) => "This recipe already has a step at that position",
        (Some("inventories"), Some("inventories_product_warehouse_unique")) => {
            "This product already has an inventory record in that warehouse"
        }
        (Some("volume_conversions"), Some("volume_conversions_pair_unique")) => "A conversion between these units already exists",
        (Some("warehouses"), Some(c)) if c.contains("code") => "A warehouse with this code already exists",
        (Some("units_of_measure"), Some(c)) if c.contains("abbreviation") => "A unit with this abbreviation already exists",
        (Some("stock_movements"), Some("stock_movements_reference_unique")) => "A movement with this reference already exists",
        (Some(_), Some(c)) if c.ends_with("_name_unique") => "A record with this name already exists",
        _ => "Resource already exists",
    };
    message.to_string()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InvalidToken { .. } | Error::TokenExpired | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::Unprocessable { .. } | Error::Conflict { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorBody {
            error: self.name().to_string(),
            message: self.user_message(),
        };
        ApiResponse::with_status(self.status_code(), body).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::StockError;
    use rust_decimal::Decimal;

    #[test]
    fn test_classification_names_and_statuses() {
        let cases: Vec<(Error, StatusCode, &str)> = vec![
            (
                Error::BadRequest { message: "bad".into() },
                StatusCode::BAD_REQUEST,
                "ValidationError",
            ),
            (Error::Unauthenticated { message: None }, StatusCode::UNAUTHORIZED, "UnauthorizedError"),
            (
                Error::InvalidToken { message: "sig".into() },
                StatusCode::UNAUTHORIZED,
                "JsonWebTokenError",
            ),
            (Error::TokenExpired, StatusCode::UNAUTHORIZED, "TokenExpiredError"),
            (
                Error::InsufficientPermissions {
                    action: Operation::Delete,
                    resource: Resource::Products,
                },
                StatusCode::FORBIDDEN,
                "Forbidden",
            ),
            (
                Error::NotFound {
                    resource: "Recipe".into(),
                    id: "1".into(),
                },
                StatusCode::NOT_FOUND,
                "NotFound",
            ),
            (
                Error::Unprocessable { message: "no".into() },
                StatusCode::UNPROCESSABLE_ENTITY,
                "Unprocessable",
            ),
            (
                Error::Internal { operation: "x".into() },
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
            ),
        ];

        for (err, status, name) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
            assert_eq!(err.name(), name, "{err:?}");
        }
    }

    #[test]
    fn test_stock_errors_are_unprocessable() {
        let err = Error::Database(DbError::Stock(StockError::InsufficientStock {
            requested: Decimal::new(5, 0),
            available: Decimal::new(2, 0),
        }));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.user_message(), "Insufficient stock: requested 5, available 2");
    }

    #[test]
    fn test_unique_violation_messages() {
        let err = Error::Database(DbError::UniqueViolation {
            constraint: Some("products_sku_unique".into()),
            table: Some("products".into()),
            message: "duplicate".into(),
            conflicting_value: Some("SKU-1".into()),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "A product with this SKU already exists");

        let generic = unique_violation_message(Some("origins"), Some("origins_name_unique"));
        assert_eq!(generic, "A record with this name already exists");
    }

    #[test]
    fn test_invalid_values_are_validation_errors() {
        let err = Error::Database(DbError::InvalidValue {
            message: "A numeric value is out of range".into(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.name(), "ValidationError");
        assert_eq!(err.user_message(), "A numeric value is out of range");
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let err = Error::Internal {
            operation: "connect to postgres at 10.0.0.1".into(),
        };
        assert_eq!(err.user_message(), "Internal server error");
    }
}
