//! Database repository for inventory rows.
//!
//! Rows are read `FOR UPDATE`, run through [`InventoryLevels`] and written
//! back with their derived columns, so `available_quantity` and `total_value`
//! never drift from the quantities they are computed from. The stock-moving
//! methods expect to run inside the caller's transaction.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::stock::{InventoryCreateDBRequest, InventoryDBResponse, InventorySummaryDBResponse, InventoryUpdateDBRequest},
};
use crate::stock::{InventoryLevels, StockError};
use crate::types::{InventoryId, ProductId, WarehouseId, abbrev_uuid};
use rust_decimal::Decimal;
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub const INVENTORY_FILTERS: &[FilterField] = &[
    FilterField::new("product_id", "product_id", FilterKind::Uuid),
    FilterField::new("warehouse_id", "warehouse_id", FilterKind::Uuid),
];

pub struct Inventories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Inventories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    async fn lock_by_id(&mut self, id: InventoryId) -> Result<Option<InventoryDBResponse>> {
        let row = sqlx::query_as::<_, InventoryDBResponse>("SELECT * FROM inventories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(row)
    }

    async fn lock(&mut self, product_id: ProductId, warehouse_id: WarehouseId) -> Result<Option<InventoryDBResponse>> {
        let row = sqlx::query_as::<_, InventoryDBResponse>(
            "SELECT * FROM inventories WHERE product_id = $1 AND warehouse_id = $2 FOR UPDATE",
        )
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(row)
    }

    async fn lock_or_create(&mut self, product_id: ProductId, warehouse_id: WarehouseId) -> Result<InventoryDBResponse> {
        sqlx::query("INSERT INTO inventories (product_id, warehouse_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(product_id)
            .bind(warehouse_id)
            .execute(&mut *self.db)
            .await?;
        self.lock(product_id, warehouse_id).await?.ok_or(DbError::NotFound)
    }

    /// Lock a product's rows in two warehouses, creating them if missing.
    ///
    /// Rows are locked in id order so concurrent transfers in opposite
    /// directions cannot deadlock.
    pub async fn lock_pair(&mut self, product_id: ProductId, first: WarehouseId, second: WarehouseId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO inventories (product_id, warehouse_id)
            SELECT $1, w FROM UNNEST($2::uuid[]) AS w
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(product_id)
        .bind(vec![first, second])
        .execute(&mut *self.db)
        .await?;

        sqlx::query("SELECT id FROM inventories WHERE product_id = $1 AND warehouse_id = ANY($2) ORDER BY id FOR UPDATE")
            .bind(product_id)
            .bind(vec![first, second])
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    async fn store_levels(
        &mut self,
        id: InventoryId,
        levels: &InventoryLevels,
        from_movement: bool,
    ) -> Result<InventoryDBResponse> {
        let row = sqlx::query_as::<_, InventoryDBResponse>(
            r#"
            UPDATE inventories SET
                quantity = $2,
                reserved_quantity = $3,
                available_quantity = $4,
                unit_cost = $5,
                total_value = $6,
                last_movement_at = CASE WHEN $7 THEN NOW() ELSE last_movement_at END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(levels.quantity)
        .bind(levels.reserved)
        .bind(levels.available())
        .bind(levels.unit_cost)
        .bind(levels.total_value())
        .bind(from_movement)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(row)
    }

    /// Receive stock into a warehouse, creating the inventory row on demand.
    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&product_id), warehouse_id = %abbrev_uuid(&warehouse_id)), err)]
    pub async fn receive(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
    ) -> Result<InventoryDBResponse> {
        let row = self.lock_or_create(product_id, warehouse_id).await?;
        let mut levels = row.levels();
        levels.receive(quantity, unit_cost)?;
        self.store_levels(row.id, &levels, true).await
    }

    /// Issue unreserved stock from a warehouse.
    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&product_id), warehouse_id = %abbrev_uuid(&warehouse_id)), err)]
    pub async fn issue(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: Decimal,
    ) -> Result<InventoryDBResponse> {
        let row = self
            .lock(product_id, warehouse_id)
            .await?
            .ok_or(StockError::InsufficientStock {
                requested: quantity,
                available: Decimal::ZERO,
            })?;
        let mut levels = row.levels();
        levels.issue(quantity)?;
        self.store_levels(row.id, &levels, true).await
    }

    /// Apply a signed correction. A missing row is only created for positive deltas.
    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&product_id), warehouse_id = %abbrev_uuid(&warehouse_id)), err)]
    pub async fn adjust(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        delta: Decimal,
    ) -> Result<InventoryDBResponse> {
        let row = match self.lock(product_id, warehouse_id).await? {
            Some(row) => row,
            None if delta > Decimal::ZERO => self.lock_or_create(product_id, warehouse_id).await?,
            None => {
                return Err(StockError::AdjustmentBelowReserved {
                    resulting: delta,
                    reserved: Decimal::ZERO,
                }
                .into());
            }
        };
        let mut levels = row.levels();
        levels.adjust(delta)?;
        self.store_levels(row.id, &levels, true).await
    }

    #[instrument(skip(self), fields(inventory_id = %abbrev_uuid(&id), %quantity), err)]
    pub async fn reserve(&mut self, id: InventoryId, quantity: Decimal) -> Result<InventoryDBResponse> {
        let mut tx = self.db.begin().await?;
        let mut inventories = Inventories::new(&mut tx);
        let row = inventories.lock_by_id(id).await?.ok_or(DbError::NotFound)?;
        let mut levels = row.levels();
        levels.reserve(quantity)?;
        let updated = inventories.store_levels(id, &levels, false).await?;
        tx.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self), fields(inventory_id = %abbrev_uuid(&id), %quantity), err)]
    pub async fn release(&mut self, id: InventoryId, quantity: Decimal) -> Result<InventoryDBResponse> {
        let mut tx = self.db.begin().await?;
        let mut inventories = Inventories::new(&mut tx);
        let row = inventories.lock_by_id(id).await?.ok_or(DbError::NotFound)?;
        let mut levels = row.levels();
        levels.release(quantity)?;
        let updated = inventories.store_levels(id, &levels, false).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Rows at or below their minimum stock.
    #[instrument(skip(self, filter), err)]
    pub async fn low_stock(&mut self, filter: &ListFilter) -> Result<Vec<InventoryDBResponse>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM inventories WHERE quantity <= min_stock");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY quantity - min_stock, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn summary(&mut self, warehouse_id: Option<WarehouseId>) -> Result<InventorySummaryDBResponse> {
        let (items, total_quantity, total_value) = sqlx::query_as::<_, (i64, Decimal, Decimal)>(
            r#"
            SELECT COUNT(*), COALESCE(SUM(quantity), 0), COALESCE(SUM(total_value), 0)
            FROM inventories
            WHERE $1::uuid IS NULL OR warehouse_id = $1
            "#,
        )
        .bind(warehouse_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(InventorySummaryDBResponse {
            items,
            total_quantity,
            total_value,
        })
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Inventories<'c> {
    type CreateRequest = InventoryCreateDBRequest;
    type UpdateRequest = InventoryUpdateDBRequest;
    type Response = InventoryDBResponse;
    type Id = InventoryId;

    #[instrument(skip(self, request), fields(product_id = %abbrev_uuid(&request.product_id), warehouse_id = %abbrev_uuid(&request.warehouse_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let row = sqlx::query_as::<_, InventoryDBResponse>(
            r#"
            INSERT INTO inventories (product_id, warehouse_id, min_stock, max_stock)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.product_id)
        .bind(request.warehouse_id)
        .bind(request.min_stock)
        .bind(request.max_stock)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(row)
    }

    #[instrument(skip(self), fields(inventory_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let row = sqlx::query_as::<_, InventoryDBResponse>("SELECT * FROM inventories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(row)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM inventories WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM inventories WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    /// Only empty rows can be deleted; stock on hand or reserved must be moved out first.
    #[instrument(skip(self), fields(inventory_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        let Some(row) = Inventories::new(&mut tx).lock_by_id(id).await? else {
            return Ok(false);
        };
        if !row.levels().is_empty() {
            return Err(StockError::InventoryNotEmpty.into());
        }

        let result = sqlx::query("DELETE FROM inventories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(inventory_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;
        let current = Inventories::new(&mut tx).lock_by_id(id).await?.ok_or(DbError::NotFound)?;

        let min_stock = request.min_stock.unwrap_or(current.min_stock);
        let max_stock = request.max_stock.or(current.max_stock);
        if max_stock.is_some_and(|max| max < min_stock) {
            return Err(DbError::RuleViolation {
                message: "min_stock must not exceed max_stock".to_string(),
            });
        }

        let row = sqlx::query_as::<_, InventoryDBResponse>(
            "UPDATE inventories SET min_stock = $2, max_stock = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(min_stock)
        .bind(max_stock)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_product, create_test_warehouse};
    use sqlx::PgPool;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_new_rows_start_empty(pool: PgPool) {
        let product = create_test_product(&pool, "OIL-1").await;
        let warehouse = create_test_warehouse(&pool, "MAIN").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Inventories::new(&mut conn);

        let row = repo
            .create(&InventoryCreateDBRequest {
                product_id: product.id,
                warehouse_id: warehouse.id,
                min_stock: dec("5"),
                max_stock: None,
            })
            .await
            .unwrap();
        assert!(row.quantity.is_zero());
        assert!(row.available_quantity.is_zero());

        let low = repo.low_stock(&ListFilter::all()).await.unwrap();
        assert_eq!(low.len(), 1);

        // Empty rows can be deleted
        assert!(repo.delete(row.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reserve_release_and_delete_guard(pool: PgPool) {
        let product = create_test_product(&pool, "RICE-1").await;
        let warehouse = create_test_warehouse(&pool, "MAIN").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Inventories::new(&mut conn);

        let row = repo.receive(product.id, warehouse.id, dec("10"), Some(dec("2"))).await.unwrap();
        assert_eq!(row.total_value, dec("20"));
        assert!(row.last_movement_at.is_some());

        let reserved = repo.reserve(row.id, dec("4")).await.unwrap();
        assert_eq!(reserved.available_quantity, dec("6"));

        let over = repo.reserve(row.id, dec("7")).await;
        assert!(matches!(over, Err(DbError::Stock(StockError::InsufficientStock { .. }))));

        // Reserved stock cannot be issued
        let issue = repo.issue(product.id, warehouse.id, dec("7")).await;
        assert!(matches!(issue, Err(DbError::Stock(StockError::InsufficientStock { .. }))));

        let released = repo.release(row.id, dec("4")).await.unwrap();
        assert_eq!(released.available_quantity, dec("10"));

        assert!(matches!(
            repo.delete(row.id).await,
            Err(DbError::Stock(StockError::InventoryNotEmpty))
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_summary_per_warehouse(pool: PgPool) {
        let product = create_test_product(&pool, "SALT-1").await;
        let main = create_test_warehouse(&pool, "MAIN").await;
        let annex = create_test_warehouse(&pool, "ANNEX").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Inventories::new(&mut conn);

        repo.receive(product.id, main.id, dec("3"), Some(dec("1.5"))).await.unwrap();
        repo.receive(product.id, annex.id, dec("2"), Some(dec("1"))).await.unwrap();

        let all = repo.summary(None).await.unwrap();
        assert_eq!(all.items, 2);
        assert_eq!(all.total_quantity, dec("5"));
        assert_eq!(all.total_value, dec("6.5"));

        let annex_only = repo.summary(Some(annex.id)).await.unwrap();
        assert_eq!(annex_only.items, 1);
        assert_eq!(annex_only.total_value, dec("2"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_adjustment_needs_existing_row(pool: PgPool) {
        let product = create_test_product(&pool, "SUGAR-1").await;
        let warehouse = create_test_warehouse(&pool, "MAIN").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Inventories::new(&mut conn);

        let result = repo.adjust(product.id, warehouse.id, dec("-1")).await;
        assert!(matches!(
            result,
            Err(DbError::Stock(StockError::AdjustmentBelowReserved { .. }))
        ));

        let row = repo.adjust(product.id, warehouse.id, dec("4")).await.unwrap();
        assert_eq!(row.quantity, dec("4"));
    }
}
