//! Database repository for margin levels.
//!
//! Products priced from a margin level store the derived selling price, so
//! changing a level's percentage re-prices every product that references it.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::products::{MarginLevelCreateDBRequest, MarginLevelDBResponse, MarginLevelUpdateDBRequest},
};
use crate::types::{MarginLevelId, abbrev_uuid};
use rust_decimal::Decimal;
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};
use tracing::{debug, instrument};

pub const MARGIN_LEVEL_FILTERS: &[FilterField] = &[FilterField::new("name", "name", FilterKind::Contains)];

pub struct MarginLevels<'c> {
    db: &'c mut PgConnection,
}

impl<'c> MarginLevels<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Percentage of a margin level, if it exists.
    pub async fn percentage(&mut self, id: MarginLevelId) -> Result<Option<Decimal>> {
        let percentage = sqlx::query_scalar::<_, Decimal>("SELECT percentage FROM margin_levels WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(percentage)
    }

    /// Recompute the selling price of every product on this level.
    ///
    /// Mirrors [`crate::pricing::apply_margin`]: Postgres `ROUND(numeric, 2)`
    /// also rounds half away from zero.
    async fn reprice_products(conn: &mut PgConnection, id: MarginLevelId, percentage: Decimal) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET selling_price = ROUND(cost_price * (1 + $2 / 100), 2)
            WHERE margin_level_id = $1
            "#,
        )
        .bind(id)
        .bind(percentage)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for MarginLevels<'c> {
    type CreateRequest = MarginLevelCreateDBRequest;
    type UpdateRequest = MarginLevelUpdateDBRequest;
    type Response = MarginLevelDBResponse;
    type Id = MarginLevelId;

    #[instrument(skip(self, request), fields(name = %request.name, percentage = %request.percentage), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let level = sqlx::query_as::<_, MarginLevelDBResponse>(
            "INSERT INTO margin_levels (name, percentage) VALUES ($1, $2) RETURNING *",
        )
        .bind(&request.name)
        .bind(request.percentage)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(level)
    }

    #[instrument(skip(self), fields(margin_level_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let level = sqlx::query_as::<_, MarginLevelDBResponse>("SELECT * FROM margin_levels WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(level)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM margin_levels WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM margin_levels WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    /// Products on a deleted level keep their last selling price and lose the link.
    #[instrument(skip(self), fields(margin_level_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM margin_levels WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(margin_level_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let level = sqlx::query_as::<_, MarginLevelDBResponse>(
            r#"
            UPDATE margin_levels SET
                name = COALESCE($2, name),
                percentage = COALESCE($3, percentage)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(request.percentage)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

        if request.percentage.is_some() {
            let repriced = Self::reprice_products(&mut tx, id, level.percentage).await?;
            debug!(repriced, "Re-priced products for margin level");
        }

        tx.commit().await?;
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{ProductCategories, Products};
    use crate::db::models::products::{ProductCategoryCreateDBRequest, ProductCreateDBRequest};
    use sqlx::PgPool;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_percentage_change_reprices_products(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let category = ProductCategories::new(&mut conn)
            .create(&ProductCategoryCreateDBRequest {
                name: "Dry goods".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let level = MarginLevels::new(&mut conn)
            .create(&MarginLevelCreateDBRequest {
                name: "Standard".to_string(),
                percentage: dec("25"),
            })
            .await
            .unwrap();

        let product = Products::new(&mut conn)
            .create(&ProductCreateDBRequest {
                name: "Flour".to_string(),
                sku: "FLOUR-001".to_string(),
                description: None,
                category_id: category.id,
                subcategory_id: None,
                supplier_id: None,
                origin_id: None,
                margin_level_id: Some(level.id),
                unit_id: None,
                cost_price: dec("1.15"),
                selling_price: Some(dec("99")),
                is_active: true,
            })
            .await
            .unwrap();
        // 1.15 * 1.25 = 1.4375
        assert_eq!(product.selling_price, dec("1.44"));

        MarginLevels::new(&mut conn)
            .update(
                level.id,
                &MarginLevelUpdateDBRequest {
                    percentage: Some(dec("10")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let repriced = Products::new(&mut conn).get_by_id(product.id).await.unwrap().unwrap();
        // 1.15 * 1.10 = 1.265, half away from zero
        assert_eq!(repriced.selling_price, dec("1.27"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_level(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let result = MarginLevels::new(&mut conn)
            .update(uuid::Uuid::new_v4(), &MarginLevelUpdateDBRequest::default())
            .await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }
}
