//! API request/response models for warehouses, inventories and stock movements.

use crate::api::models::recipes::require_name;
use crate::db::models::stock::{InventoryDBResponse, InventorySummaryDBResponse, StockMovementDBResponse, WarehouseDBResponse};
use crate::errors::Error;
use crate::stock::{MovementStatus, MovementType};
use crate::types::{InventoryId, ProductId, StockMovementId, UserId, WarehouseId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseCreate {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl WarehouseCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)?;
        require_name("code", &self.code)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarehouseUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseResponse {
    pub id: WarehouseId,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WarehouseDBResponse> for WarehouseResponse {
    fn from(db: WarehouseDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            code: db.code,
            address: db.address,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

fn check_stock_bounds(min_stock: Option<Decimal>, max_stock: Option<Decimal>) -> Result<(), Error> {
    if min_stock.is_some_and(|m| m < Decimal::ZERO) || max_stock.is_some_and(|m| m < Decimal::ZERO) {
        return Err(Error::BadRequest {
            message: "stock thresholds must not be negative".to_string(),
        });
    }
    if matches!((min_stock, max_stock), (Some(min), Some(max)) if min > max) {
        return Err(Error::BadRequest {
            message: "min_stock must not exceed max_stock".to_string(),
        });
    }
    Ok(())
}

/// Registers a product in a warehouse. Quantities start at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryCreate {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
}

impl InventoryCreate {
    pub fn validate(&self) -> Result<(), Error> {
        check_stock_bounds(self.min_stock, self.max_stock)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryUpdate {
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
}

impl InventoryUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        check_stock_bounds(self.min_stock, self.max_stock)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryResponse {
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

impl From<InventoryDBResponse> for InventoryResponse {
    fn from(db: InventoryDBResponse) -> Self {
        Self {
            id: db.id,
            product_id: db.product_id,
            warehouse_id: db.warehouse_id,
            quantity: db.quantity,
            reserved_quantity: db.reserved_quantity,
            available_quantity: db.available_quantity,
            unit_cost: db.unit_cost,
            total_value: db.total_value,
            min_stock: db.min_stock,
            max_stock: db.max_stock,
            last_movement_at: db.last_movement_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Body of reserve/release requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityRequest {
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventorySummaryQuery {
    pub warehouse_id: Option<WarehouseId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySummaryResponse {
    pub items: i64,
    pub total_quantity: Decimal,
    pub total_value: Decimal,
}

impl From<InventorySummaryDBResponse> for InventorySummaryResponse {
    fn from(db: InventorySummaryDBResponse) -> Self {
        Self {
            items: db.items,
            total_quantity: db.total_quantity,
            total_value: db.total_value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovementCreate {
    pub movement_type: MovementType,
    /// Defaults to DRAFT. Creating as COMPLETED applies the movement immediately.
    pub status: Option<MovementStatus>,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub destination_warehouse_id: Option<WarehouseId>,
    /// Signed delta for adjustments, positive otherwise
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockMovementUpdate {
    pub product_id: Option<ProductId>,
    pub warehouse_id: Option<WarehouseId>,
    pub destination_warehouse_id: Option<WarehouseId>,
    pub quantity: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: MovementStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovementResponse {
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

impl From<StockMovementDBResponse> for StockMovementResponse {
    fn from(db: StockMovementDBResponse) -> Self {
        Self {
            id: db.id,
            reference: db.reference,
            movement_type: db.movement_type,
            status: db.status,
            product_id: db.product_id,
            warehouse_id: db.warehouse_id,
            destination_warehouse_id: db.destination_warehouse_id,
            quantity: db.quantity,
            unit_cost: db.unit_cost,
            total_cost: db.total_cost,
            notes: db.notes,
            scheduled_at: db.scheduled_at,
            completed_at: db.completed_at,
            created_by: db.created_by,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_bounds() {
        let dec = |s: &str| s.parse::<Decimal>().unwrap();
        assert!(check_stock_bounds(Some(dec("5")), Some(dec("10"))).is_ok());
        assert!(check_stock_bounds(Some(dec("10")), Some(dec("5"))).is_err());
        assert!(check_stock_bounds(Some(dec("-1")), None).is_err());
        assert!(check_stock_bounds(None, None).is_ok());
    }

    #[test]
    fn test_movement_create_accepts_string_decimals() {
        let body = serde_json::json!({
            "movement_type": "TRANSFER",
            "product_id": uuid::Uuid::new_v4(),
            "warehouse_id": uuid::Uuid::new_v4(),
            "destination_warehouse_id": uuid::Uuid::new_v4(),
            "quantity": "2.500",
        });
        let create: StockMovementCreate = serde_json::from_value(body).unwrap();
        assert_eq!(create.movement_type, MovementType::Transfer);
        assert_eq!(create.quantity, "2.5".parse::<Decimal>().unwrap());
        assert!(create.status.is_none());
    }
}
