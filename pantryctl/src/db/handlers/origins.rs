use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::products::{OriginCreateDBRequest, OriginDBResponse, OriginUpdateDBRequest},
};
use crate::types::{OriginId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub const ORIGIN_FILTERS: &[FilterField] = &[
    FilterField::new("name", "name", FilterKind::Contains),
    FilterField::new("code", "code", FilterKind::Equals),
];

pub struct Origins<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Origins<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Origins<'c> {
    type CreateRequest = OriginCreateDBRequest;
    type UpdateRequest = OriginUpdateDBRequest;
    type Response = OriginDBResponse;
    type Id = OriginId;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let origin =
            sqlx::query_as::<_, OriginDBResponse>("INSERT INTO origins (name, code) VALUES ($1, $2) RETURNING *")
                .bind(&request.name)
                .bind(&request.code)
                .fetch_one(&mut *self.db)
                .await?;
        Ok(origin)
    }

    #[instrument(skip(self), fields(origin_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let origin = sqlx::query_as::<_, OriginDBResponse>("SELECT * FROM origins WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(origin)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM origins WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM origins WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), fields(origin_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM origins WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(origin_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, OriginDBResponse>(
            "UPDATE origins SET name = COALESCE($2, name), code = COALESCE($3, code) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.code)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}
