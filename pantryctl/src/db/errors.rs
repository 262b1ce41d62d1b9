use crate::stock::StockError;
use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
        /// The conflicting value that caused the violation (if extractable)
        conflicting_value: Option<String>,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Stock bookkeeping rule rejected the change
    #[error(transparent)]
    Stock(#[from] StockError),

    /// A value the schema cannot hold, e.g. a number past its column's precision
    #[error("{message}")]
    InvalidValue { message: String },

    /// A cross-row rule the schema cannot express (e.g. a subcategory from another category)
    #[error("{message}")]
    RuleViolation { message: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let conflicting_value = db_err
                        .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                        .and_then(|pg_err| pg_err.detail())
                        .and_then(extract_conflicting_value);

                    DbError::UniqueViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                        conflicting_value,
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if let Some(message) = db_err.code().as_deref().and_then(invalid_value_message) {
                    DbError::InvalidValue {
                        message: message.to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Client-facing messages for data exceptions (SQLSTATE class 22) caused by request values.
fn invalid_value_message(code: &str) -> Option<&'static str> {
    match code {
        "22003" => Some("A numeric value is out of range"),
        "22P02" | "22007" | "22008" => Some("A value has an invalid format"),
        _ => None,
    }
}

/// Extract the conflicting value from a PostgreSQL unique violation detail.
///
/// Details look like `Key (sku)=(FLOUR-001) already exists.`; composite keys
/// come back as a comma separated tuple and are returned as-is.
fn extract_conflicting_value(detail: &str) -> Option<String> {
    let start = detail.find("=(")? + 2;
    let end = detail[start..].rfind(')')?;
    Some(detail[start..start + end].to_string())
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_conflicting_value() {
        assert_eq!(
            extract_conflicting_value("Key (sku)=(FLOUR-001) already exists."),
            Some("FLOUR-001".to_string())
        );
        assert_eq!(
            extract_conflicting_value("Key (recipe_id, position)=(4b1c, 2) already exists."),
            Some("4b1c, 2".to_string())
        );
        assert_eq!(extract_conflicting_value("no detail"), None);
    }

    #[test]
    fn test_invalid_value_codes() {
        assert_eq!(invalid_value_message("22003"), Some("A numeric value is out of range"));
        assert_eq!(invalid_value_message("22P02"), Some("A value has an invalid format"));
        assert_eq!(invalid_value_message("23505"), None);
        assert_eq!(invalid_value_message("40001"), None);
    }
}
