//! Database repository for units of measure.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::units::{UnitCreateDBRequest, UnitDBResponse, UnitUpdateDBRequest},
};
use crate::types::{UnitId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub const UNIT_FILTERS: &[FilterField] = &[
    FilterField::new("name", "name", FilterKind::Contains),
    FilterField::new("abbreviation", "abbreviation", FilterKind::Equals),
    FilterField::new("kind", "kind", FilterKind::Equals),
];

pub struct Units<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Units<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Units<'c> {
    type CreateRequest = UnitCreateDBRequest;
    type UpdateRequest = UnitUpdateDBRequest;
    type Response = UnitDBResponse;
    type Id = UnitId;

    #[instrument(skip(self, request), fields(abbreviation = %request.abbreviation), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let unit = sqlx::query_as::<_, UnitDBResponse>(
            "INSERT INTO units_of_measure (name, abbreviation, kind) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&request.name)
        .bind(&request.abbreviation)
        .bind(request.kind)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(unit)
    }

    #[instrument(skip(self), fields(unit_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let unit = sqlx::query_as::<_, UnitDBResponse>("SELECT * FROM units_of_measure WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(unit)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM units_of_measure WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM units_of_measure WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), fields(unit_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM units_of_measure WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(unit_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, UnitDBResponse>(
            r#"
            UPDATE units_of_measure SET
                name = COALESCE($2, name),
                abbreviation = COALESCE($3, abbreviation),
                kind = COALESCE($4, kind)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.abbreviation)
        .bind(request.kind)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}
