//! Database models for warehouses, inventories and stock movements.

use crate::api::models::stock::{InventoryCreate, InventoryUpdate, StockMovementCreate, StockMovementUpdate, WarehouseCreate, WarehouseUpdate};
use crate::stock::{InventoryLevels, MovementStatus, MovementType};
use crate::types::{InventoryId, ProductId, StockMovementId, UserId, WarehouseId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct WarehouseCreateDBRequest {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub is_active: bool,
}

impl From<WarehouseCreate> for WarehouseCreateDBRequest {
    fn from(api: WarehouseCreate) -> Self {
        Self {
            name: api.name,
            code: api.code,
            address: api.address,
            is_active: api.is_active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WarehouseUpdateDBRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl From<WarehouseUpdate> for WarehouseUpdateDBRequest {
    fn from(api: WarehouseUpdate) -> Self {
        Self {
            name: api.name,
            code: api.code,
            address: api.address,
            is_active: api.is_active,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct WarehouseDBResponse {
    pub id: WarehouseId,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inventory rows always start empty; quantities only move through stock
/// movements and reservations.
#[derive(Debug, Clone)]
pub struct InventoryCreateDBRequest {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub min_stock: Decimal,
    pub max_stock: Option<Decimal>,
}

impl From<InventoryCreate> for InventoryCreateDBRequest {
    fn from(api: InventoryCreate) -> Self {
        Self {
            product_id: api.product_id,
            warehouse_id: api.warehouse_id,
            min_stock: api.min_stock.unwrap_or(Decimal::ZERO),
            max_stock: api.max_stock,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InventoryUpdateDBRequest {
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
}

impl From<InventoryUpdate> for InventoryUpdateDBRequest {
    fn from(api: InventoryUpdate) -> Self {
        Self {
            min_stock: api.min_stock,
            max_stock: api.max_stock,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InventoryDBResponse {
    pub id: InventoryId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: Decimal,
    pub reserved_quantity: Decimal,
    pub available_quantity: Decimal,
    pub unit_cost: Decimal,
    pub total_value: Decimal,
    pub min_stock: Decimal,
    pub max_stock: Option<Decimal>,
    pub last_movement_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryDBResponse {
    pub fn levels(&self) -> InventoryLevels {
        InventoryLevels::new(self.quantity, self.reserved_quantity, self.unit_cost)
    }
}

/// Totals for `/inventories/summary`.
#[derive(Debug, Clone)]
pub struct InventorySummaryDBResponse {
    pub items: i64,
    pub total_quantity: Decimal,
    pub total_value: Decimal,
}

#[derive(Debug, Clone)]
pub struct StockMovementCreateDBRequest {
    pub movement_type: MovementType,
    pub status: MovementStatus,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub destination_warehouse_id: Option<WarehouseId>,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
}

impl StockMovementCreateDBRequest {
    pub fn new(api: StockMovementCreate, created_by: UserId) -> Self {
        Self {
            movement_type: api.movement_type,
            status: api.status.unwrap_or(MovementStatus::Draft),
            product_id: api.product_id,
            warehouse_id: api.warehouse_id,
            destination_warehouse_id: api.destination_warehouse_id,
            quantity: api.quantity,
            unit_cost: api.unit_cost,
            notes: api.notes,
            scheduled_at: api.scheduled_at,
            created_by: Some(created_by),
        }
    }
}

/// Editable fields of a movement that has not started yet. Type and status
/// are fixed here; status moves only through transitions.
#[derive(Debug, Clone, Default)]
pub struct StockMovementUpdateDBRequest {
    pub product_id: Option<ProductId>,
    pub warehouse_id: Option<WarehouseId>,
    pub destination_warehouse_id: Option<WarehouseId>,
    pub quantity: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl From<StockMovementUpdate> for StockMovementUpdateDBRequest {
    fn from(api: StockMovementUpdate) -> Self {
        Self {
            product_id: api.product_id,
            warehouse_id: api.warehouse_id,
            destination_warehouse_id: api.destination_warehouse_id,
            quantity: api.quantity,
            unit_cost: api.unit_cost,
            notes: api.notes,
            scheduled_at: api.scheduled_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StockMovementDBResponse {
    pub id: StockMovementId,
    pub reference: String,
    pub movement_type: MovementType,
    pub status: MovementStatus,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub destination_warehouse_id: Option<WarehouseId>,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
