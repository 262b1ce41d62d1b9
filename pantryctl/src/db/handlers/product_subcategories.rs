//! Database repository for product subcategories.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::products::{
        ProductSubcategoryCreateDBRequest, ProductSubcategoryDBResponse, ProductSubcategoryUpdateDBRequest,
    },
};
use crate::types::{ProductSubcategoryId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub const PRODUCT_SUBCATEGORY_FILTERS: &[FilterField] = &[
    FilterField::new("name", "name", FilterKind::Contains),
    FilterField::new("category_id", "category_id", FilterKind::Uuid),
];

pub struct ProductSubcategories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ProductSubcategories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for ProductSubcategories<'c> {
    type CreateRequest = ProductSubcategoryCreateDBRequest;
    type UpdateRequest = ProductSubcategoryUpdateDBRequest;
    type Response = ProductSubcategoryDBResponse;
    type Id = ProductSubcategoryId;

    #[instrument(skip(self, request), fields(name = %request.name, category_id = %abbrev_uuid(&request.category_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let subcategory = sqlx::query_as::<_, ProductSubcategoryDBResponse>(
            "INSERT INTO product_subcategories (category_id, name, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(request.category_id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(subcategory)
    }

    #[instrument(skip(self), fields(subcategory_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let subcategory =
            sqlx::query_as::<_, ProductSubcategoryDBResponse>("SELECT * FROM product_subcategories WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;
        Ok(subcategory)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM product_subcategories WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM product_subcategories WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), fields(subcategory_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM product_subcategories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(subcategory_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, ProductSubcategoryDBResponse>(
            r#"
            UPDATE product_subcategories SET
                category_id = COALESCE($2, category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.category_id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}
