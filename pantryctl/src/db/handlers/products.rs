//! Database repository for products.
//!
//! Selling prices are resolved here on every write: a product on a margin
//! level is priced from its cost, anything else keeps its explicit price.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        margin_levels::MarginLevels,
        repository::Repository,
    },
    models::products::{ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest},
};
use crate::pricing::resolve_selling_price;
use crate::types::{MarginLevelId, ProductCategoryId, ProductId, ProductSubcategoryId, abbrev_uuid};
use rust_decimal::Decimal;
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub const PRODUCT_FILTERS: &[FilterField] = &[
    FilterField::new("name", "name", FilterKind::Contains),
    FilterField::new("sku", "sku", FilterKind::Contains),
    FilterField::new("category_id", "category_id", FilterKind::Uuid),
    FilterField::new("subcategory_id", "subcategory_id", FilterKind::Uuid),
    FilterField::new("supplier_id", "supplier_id", FilterKind::Uuid),
    FilterField::new("origin_id", "origin_id", FilterKind::Uuid),
    FilterField::new("margin_level_id", "margin_level_id", FilterKind::Uuid),
    FilterField::new("is_active", "is_active", FilterKind::Bool),
];

fn price_out_of_range() -> DbError {
    DbError::InvalidValue {
        message: "Selling price is out of range".to_string(),
    }
}

pub struct Products<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Products<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Reject a subcategory that belongs to a different category.
    ///
    /// An unknown subcategory is left to the foreign key.
    async fn check_subcategory(
        conn: &mut PgConnection,
        category_id: ProductCategoryId,
        subcategory_id: Option<ProductSubcategoryId>,
    ) -> Result<()> {
        let Some(subcategory_id) = subcategory_id else {
            return Ok(());
        };
        let parent = sqlx::query_scalar::<_, ProductCategoryId>("SELECT category_id FROM product_subcategories WHERE id = $1")
            .bind(subcategory_id)
            .fetch_optional(&mut *conn)
            .await?;
        match parent {
            Some(parent) if parent != category_id => Err(DbError::RuleViolation {
                message: "Subcategory does not belong to the product's category".to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn margin_percentage(conn: &mut PgConnection, margin_level_id: Option<MarginLevelId>) -> Result<Option<Decimal>> {
        match margin_level_id {
            Some(id) => MarginLevels::new(conn).percentage(id).await,
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Products<'c> {
    type CreateRequest = ProductCreateDBRequest;
    type UpdateRequest = ProductUpdateDBRequest;
    type Response = ProductDBResponse;
    type Id = ProductId;

    #[instrument(skip(self, request), fields(sku = %request.sku), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        Self::check_subcategory(&mut tx, request.category_id, request.subcategory_id).await?;
        let percentage = Self::margin_percentage(&mut tx, request.margin_level_id).await?;
        let selling_price =
            resolve_selling_price(request.cost_price, percentage, request.selling_price).ok_or_else(price_out_of_range)?;

        let product = sqlx::query_as::<_, ProductDBResponse>(
            r#"
            INSERT INTO products (
                name, sku, description, category_id, subcategory_id, supplier_id, origin_id,
                margin_level_id, unit_id, cost_price, selling_price, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.sku)
        .bind(&request.description)
        .bind(request.category_id)
        .bind(request.subcategory_id)
        .bind(request.supplier_id)
        .bind(request.origin_id)
        .bind(request.margin_level_id)
        .bind(request.unit_id)
        .bind(request.cost_price)
        .bind(selling_price)
        .bind(request.is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let product = sqlx::query_as::<_, ProductDBResponse>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(product)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let current = sqlx::query_as::<_, ProductDBResponse>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        let category_id = request.category_id.unwrap_or(current.category_id);
        let subcategory_id = request.subcategory_id.unwrap_or(current.subcategory_id);
        Self::check_subcategory(&mut tx, category_id, subcategory_id).await?;

        let margin_level_id = request.margin_level_id.unwrap_or(current.margin_level_id);
        let cost_price = request.cost_price.unwrap_or(current.cost_price);
        let percentage = Self::margin_percentage(&mut tx, margin_level_id).await?;
        let selling_price = resolve_selling_price(
            cost_price,
            percentage,
            Some(request.selling_price.unwrap_or(current.selling_price)),
        )
        .ok_or_else(price_out_of_range)?;

        let product = sqlx::query_as::<_, ProductDBResponse>(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                sku = COALESCE($3, sku),
                description = COALESCE($4, description),
                category_id = $5,
                subcategory_id = $6,
                supplier_id = COALESCE($7, supplier_id),
                origin_id = COALESCE($8, origin_id),
                margin_level_id = $9,
                unit_id = COALESCE($10, unit_id),
                cost_price = $11,
                selling_price = $12,
                is_active = COALESCE($13, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.sku)
        .bind(&request.description)
        .bind(category_id)
        .bind(subcategory_id)
        .bind(request.supplier_id)
        .bind(request.origin_id)
        .bind(margin_level_id)
        .bind(request.unit_id)
        .bind(cost_price)
        .bind(selling_price)
        .bind(request.is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(product)
    }
}
