use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::stock::{WarehouseCreateDBRequest, WarehouseDBResponse, WarehouseUpdateDBRequest},
};
use crate::types::{WarehouseId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub const WAREHOUSE_FILTERS: &[FilterField] = &[
    FilterField::new("name", "name", FilterKind::Contains),
    FilterField::new("code", "code", FilterKind::Equals),
    FilterField::new("is_active", "is_active", FilterKind::Bool),
];

pub struct Warehouses<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Warehouses<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Warehouses<'c> {
    type CreateRequest = WarehouseCreateDBRequest;
    type UpdateRequest = WarehouseUpdateDBRequest;
    type Response = WarehouseDBResponse;
    type Id = WarehouseId;

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let warehouse = sqlx::query_as::<_, WarehouseDBResponse>(
            "INSERT INTO warehouses (name, code, address, is_active) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&request.name)
        .bind(&request.code)
        .bind(&request.address)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(warehouse)
    }

    #[instrument(skip(self), fields(warehouse_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let warehouse = sqlx::query_as::<_, WarehouseDBResponse>("SELECT * FROM warehouses WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(warehouse)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM warehouses WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM warehouses WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    /// Warehouses referenced by movements fail with a foreign key violation.
    #[instrument(skip(self), fields(warehouse_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM warehouses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(warehouse_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, WarehouseDBResponse>(
            r#"
            UPDATE warehouses SET
                name = COALESCE($2, name),
                code = COALESCE($3, code),
                address = COALESCE($4, address),
                is_active = COALESCE($5, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.code)
        .bind(&request.address)
        .bind(request.is_active)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}
