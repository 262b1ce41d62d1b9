//! Allow-listed list filters shared by every repository.
//!
//! Each repository publishes a static `&[FilterField]` naming the query
//! parameters it accepts and the column each one maps to. Column names are
//! only ever taken from those static tables, never from the request, so they
//! can be pushed into SQL directly while values are always bound.

use std::collections::HashMap;

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// How a filter parameter is matched against its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Case-insensitive substring match
    Contains,
    /// Exact text match (also used for TEXT-backed enums)
    Equals,
    Uuid,
    Bool,
    /// UUID contained in the array the column expression yields
    UuidMember,
}

/// One entry of a repository's filter allow-list.
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    /// Query parameter name
    pub param: &'static str,
    /// SQL expression the parameter is compared against
    pub column: &'static str,
    pub kind: FilterKind,
}

impl FilterField {
    pub const fn new(param: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self { param, column, kind }
    }
}

/// A parsed filter condition with its bound value.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Contains(&'static str, String),
    Equals(&'static str, String),
    Uuid(&'static str, Uuid),
    Bool(&'static str, bool),
    UuidMember(&'static str, Uuid),
}

/// A filter parameter whose value could not be parsed for its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFilter {
    pub param: &'static str,
    pub value: String,
}

/// Pagination and conditions for a repository `list`/`count` call.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub skip: i64,
    /// `None` returns every matching row
    pub limit: Option<i64>,
    pub conditions: Vec<Condition>,
}

impl ListFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit: Some(limit),
            conditions: Vec::new(),
        }
    }

    /// No pagination, no conditions.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Build conditions from raw query parameters.
    ///
    /// Parameters outside `allowed` are ignored; empty values are skipped.
    pub fn from_params(
        allowed: &[FilterField],
        params: &HashMap<String, String>,
        skip: i64,
        limit: Option<i64>,
    ) -> Result<Self, InvalidFilter> {
        let mut conditions = Vec::new();
        for field in allowed {
            let Some(raw) = params.get(field.param).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
                continue;
            };
            let invalid = || InvalidFilter {
                param: field.param,
                value: raw.to_string(),
            };
            let condition = match field.kind {
                FilterKind::Contains => Condition::Contains(field.column, raw.to_string()),
                FilterKind::Equals => Condition::Equals(field.column, raw.to_string()),
                FilterKind::Uuid => Condition::Uuid(field.column, Uuid::parse_str(raw).map_err(|_| invalid())?),
                FilterKind::Bool => Condition::Bool(field.column, raw.parse::<bool>().map_err(|_| invalid())?),
                FilterKind::UuidMember => Condition::UuidMember(field.column, Uuid::parse_str(raw).map_err(|_| invalid())?),
            };
            conditions.push(condition);
        }
        Ok(Self { skip, limit, conditions })
    }

    /// Append `AND ...` for every condition. The builder must already contain a WHERE clause.
    pub fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        for condition in &self.conditions {
            match condition {
                Condition::Contains(column, value) => {
                    query.push(format!(" AND {column} ILIKE "));
                    query.push_bind(format!("%{}%", escape_like(value)));
                }
                Condition::Equals(column, value) => {
                    query.push(format!(" AND {column} = "));
                    query.push_bind(value.clone());
                }
                Condition::Uuid(column, value) => {
                    query.push(format!(" AND {column} = "));
                    query.push_bind(*value);
                }
                Condition::Bool(column, value) => {
                    query.push(format!(" AND {column} = "));
                    query.push_bind(*value);
                }
                Condition::UuidMember(column, value) => {
                    query.push(" AND ");
                    query.push_bind(*value);
                    query.push(format!(" = ANY({column})"));
                }
            }
        }
    }

    /// Append `LIMIT`/`OFFSET` when paginated.
    pub fn push_pagination(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(limit) = self.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }
        if self.skip > 0 {
            query.push(" OFFSET ");
            query.push_bind(self.skip);
        }
    }
}

fn escape_like(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FilterField] = &[
        FilterField::new("name", "name", FilterKind::Contains),
        FilterField::new("status", "status", FilterKind::Equals),
        FilterField::new("product_id", "product_id", FilterKind::Uuid),
        FilterField::new("is_active", "is_active", FilterKind::Bool),
    ];

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_unknown_params_ignored() {
        let filter = ListFilter::from_params(FIELDS, &params(&[("password_hash", "x"), ("name", "flour")]), 0, Some(10)).unwrap();
        assert_eq!(filter.conditions, vec![Condition::Contains("name", "flour".to_string())]);
    }

    #[test]
    fn test_typed_params_parsed() {
        let id = Uuid::new_v4();
        let filter = ListFilter::from_params(
            FIELDS,
            &params(&[("product_id", &id.to_string()), ("is_active", "false"), ("status", "DRAFT")]),
            5,
            None,
        )
        .unwrap();
        assert_eq!(filter.skip, 5);
        assert_eq!(filter.limit, None);
        assert!(filter.conditions.contains(&Condition::Uuid("product_id", id)));
        assert!(filter.conditions.contains(&Condition::Bool("is_active", false)));
        assert!(filter.conditions.contains(&Condition::Equals("status", "DRAFT".to_string())));
    }

    #[test]
    fn test_invalid_typed_params_rejected() {
        let err = ListFilter::from_params(FIELDS, &params(&[("product_id", "not-a-uuid")]), 0, None).unwrap_err();
        assert_eq!(err.param, "product_id");
        assert!(ListFilter::from_params(FIELDS, &params(&[("is_active", "maybe")]), 0, None).is_err());
    }

    #[test]
    fn test_empty_values_skipped() {
        let filter = ListFilter::from_params(FIELDS, &params(&[("name", "  ")]), 0, None).unwrap();
        assert!(filter.conditions.is_empty());
    }

    #[test]
    fn test_push_conditions_binds_values() {
        let filter = ListFilter::new(20, 10)
            .with_condition(Condition::Contains("name", "50%".to_string()))
            .with_condition(Condition::Bool("is_active", true));
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE 1=1");
        filter.push_conditions(&mut query);
        filter.push_pagination(&mut query);
        assert_eq!(
            query.sql(),
            "SELECT * FROM products WHERE 1=1 AND name ILIKE $1 AND is_active = $2 LIMIT $3 OFFSET $4"
        );
    }
}
