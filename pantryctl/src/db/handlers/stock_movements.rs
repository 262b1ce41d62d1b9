//! Database repository for stock movements.
//!
//! A movement is a planned or completed change to inventory. It only touches
//! inventory when it reaches COMPLETED, either on creation or through
//! [`StockMovements::transition`], and always inside the same transaction as
//! the status change.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        inventories::Inventories,
        repository::Repository,
    },
    models::stock::{StockMovementCreateDBRequest, StockMovementDBResponse, StockMovementUpdateDBRequest},
};
use crate::stock::{
    COST_SCALE, MovementStatus, MovementType, StockError,
    reference::{generate_reference, reference_stem},
};
use crate::types::{StockMovementId, WarehouseId, abbrev_uuid};
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};
use tracing::{info, instrument};

pub const STOCK_MOVEMENT_FILTERS: &[FilterField] = &[
    FilterField::new("reference", "reference", FilterKind::Contains),
    FilterField::new("movement_type", "movement_type", FilterKind::Equals),
    FilterField::new("status", "status", FilterKind::Equals),
    FilterField::new("product_id", "product_id", FilterKind::Uuid),
    FilterField::new("warehouse_id", "warehouse_id", FilterKind::Uuid),
];

/// `|quantity| × unit_cost`, kept to four places like inventory values.
fn total_cost(quantity: Decimal, unit_cost: Option<Decimal>) -> Result<Option<Decimal>> {
    let Some(cost) = unit_cost else {
        return Ok(None);
    };
    let total = quantity.abs().checked_mul(cost).ok_or_else(|| DbError::InvalidValue {
        message: "Movement total cost is out of range".to_string(),
    })?;
    Ok(Some(total.round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero)))
}

fn validate(
    movement_type: MovementType,
    quantity: Decimal,
    unit_cost: Option<Decimal>,
    warehouse_id: WarehouseId,
    destination: Option<WarehouseId>,
) -> std::result::Result<(), StockError> {
    movement_type.validate(quantity, unit_cost, destination.map(|dest| dest != warehouse_id))
}

pub struct StockMovements<'c> {
    db: &'c mut PgConnection,
}

impl<'c> StockMovements<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    async fn lock(conn: &mut PgConnection, id: StockMovementId) -> Result<StockMovementDBResponse> {
        sqlx::query_as::<_, StockMovementDBResponse>("SELECT * FROM stock_movements WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or(DbError::NotFound)
    }

    /// Apply a completed movement to inventory.
    async fn apply(conn: &mut PgConnection, movement: &StockMovementDBResponse) -> Result<()> {
        let mut inventories = Inventories::new(conn);
        match movement.movement_type {
            MovementType::Incoming | MovementType::Return => {
                inventories
                    .receive(movement.product_id, movement.warehouse_id, movement.quantity, movement.unit_cost)
                    .await?;
            }
            MovementType::Outgoing => {
                inventories
                    .issue(movement.product_id, movement.warehouse_id, movement.quantity)
                    .await?;
            }
            MovementType::Adjustment => {
                inventories
                    .adjust(movement.product_id, movement.warehouse_id, movement.quantity)
                    .await?;
            }
            MovementType::Transfer => {
                let destination = movement.destination_warehouse_id.ok_or(StockError::InvalidDestination)?;
                inventories
                    .lock_pair(movement.product_id, movement.warehouse_id, destination)
                    .await?;
                let source = inventories
                    .issue(movement.product_id, movement.warehouse_id, movement.quantity)
                    .await?;
                inventories
                    .receive(movement.product_id, destination, movement.quantity, Some(source.unit_cost))
                    .await?;
            }
        }

        info!(
            reference = %movement.reference,
            movement_type = %movement.movement_type,
            quantity = %movement.quantity,
            "Applied stock movement"
        );
        Ok(())
    }

    /// Move a movement along its lifecycle, applying it to inventory when it completes.
    #[instrument(skip(self), fields(movement_id = %abbrev_uuid(&id), %status), err)]
    pub async fn transition(&mut self, id: StockMovementId, status: MovementStatus) -> Result<StockMovementDBResponse> {
        let mut tx = self.db.begin().await?;

        let current = Self::lock(&mut tx, id).await?;
        let next = current.status.transition_to(status)?;
        if next == MovementStatus::Completed {
            Self::apply(&mut tx, &current).await?;
        }

        let movement = sqlx::query_as::<_, StockMovementDBResponse>(
            r#"
            UPDATE stock_movements SET
                status = $2,
                completed_at = CASE WHEN $2 = 'COMPLETED' THEN NOW() ELSE completed_at END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(movement)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for StockMovements<'c> {
    type CreateRequest = StockMovementCreateDBRequest;
    type UpdateRequest = StockMovementUpdateDBRequest;
    type Response = StockMovementDBResponse;
    type Id = StockMovementId;

    #[instrument(skip(self, request), fields(movement_type = %request.movement_type, status = %request.status), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        validate(
            request.movement_type,
            request.quantity,
            request.unit_cost,
            request.warehouse_id,
            request.destination_warehouse_id,
        )?;
        if !request.status.is_valid_initial() {
            return Err(StockError::InvalidInitialStatus(request.status).into());
        }

        let mut tx = self.db.begin().await?;

        // References are sequential per prefix and day; serialise writers on the stem.
        let today = Utc::now().date_naive();
        let stem = reference_stem(request.movement_type, today);
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&stem)
            .execute(&mut *tx)
            .await?;

        let previous = sqlx::query_scalar::<_, String>(
            r#"
            SELECT reference FROM stock_movements
            WHERE reference LIKE $1 || '-%'
            ORDER BY length(reference) DESC, reference DESC
            LIMIT 1
            "#,
        )
        .bind(&stem)
        .fetch_optional(&mut *tx)
        .await?;
        let reference = generate_reference(request.movement_type, today, previous.as_deref());

        let movement = sqlx::query_as::<_, StockMovementDBResponse>(
            r#"
            INSERT INTO stock_movements (
                reference, movement_type, status, product_id, warehouse_id, destination_warehouse_id,
                quantity, unit_cost, total_cost, notes, scheduled_at, created_by, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, CASE WHEN $3 = 'COMPLETED' THEN NOW() END)
            RETURNING *
            "#,
        )
        .bind(&reference)
        .bind(request.movement_type)
        .bind(request.status)
        .bind(request.product_id)
        .bind(request.warehouse_id)
        .bind(request.destination_warehouse_id)
        .bind(request.quantity)
        .bind(request.unit_cost)
        .bind(total_cost(request.quantity, request.unit_cost)?)
        .bind(&request.notes)
        .bind(request.scheduled_at)
        .bind(request.created_by)
        .fetch_one(&mut *tx)
        .await?;

        if movement.status == MovementStatus::Completed {
            Self::apply(&mut tx, &movement).await?;
        }

        tx.commit().await?;
        Ok(movement)
    }

    #[instrument(skip(self), fields(movement_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let movement = sqlx::query_as::<_, StockMovementDBResponse>("SELECT * FROM stock_movements WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(movement)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM stock_movements WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM stock_movements WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), fields(movement_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        let current = match Self::lock(&mut tx, id).await {
            Ok(current) => current,
            Err(DbError::NotFound) => return Ok(false),
            Err(e) => return Err(e),
        };
        if !current.status.is_deletable() {
            return Err(StockError::Locked {
                reference: current.reference,
                status: current.status,
                action: "deleted",
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM stock_movements WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(movement_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock(&mut tx, id).await?;
        if !current.status.is_editable() {
            return Err(StockError::Locked {
                reference: current.reference,
                status: current.status,
                action: "edited",
            }
            .into());
        }

        let warehouse_id = request.warehouse_id.unwrap_or(current.warehouse_id);
        let destination = request.destination_warehouse_id.or(current.destination_warehouse_id);
        let quantity = request.quantity.unwrap_or(current.quantity);
        let unit_cost = request.unit_cost.or(current.unit_cost);
        validate(current.movement_type, quantity, unit_cost, warehouse_id, destination)?;

        let movement = sqlx::query_as::<_, StockMovementDBResponse>(
            r#"
            UPDATE stock_movements SET
                product_id = COALESCE($2, product_id),
                warehouse_id = $3,
                destination_warehouse_id = $4,
                quantity = $5,
                unit_cost = $6,
                total_cost = $7,
                notes = COALESCE($8, notes),
                scheduled_at = COALESCE($9, scheduled_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.product_id)
        .bind(warehouse_id)
        .bind(destination)
        .bind(quantity)
        .bind(unit_cost)
        .bind(total_cost(quantity, unit_cost)?)
        .bind(&request.notes)
        .bind(request.scheduled_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(movement)
    }
}
