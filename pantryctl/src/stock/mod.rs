//! Stock movement engine rules.
//!
//! Everything in this module is pure bookkeeping with no database access, so
//! it can be exercised directly in unit tests. The repositories in
//! [`crate::db::handlers::stock_movements`] and [`crate::db::handlers::inventories`]
//! load rows, run them through these rules and persist the result inside a
//! single transaction.
//!
//! - [`movement`]: movement types and the status lifecycle
//! - [`reference`]: human-readable movement reference numbers
//! - [`levels`]: inventory quantity, reservation and valuation arithmetic

pub mod levels;
pub mod movement;
pub mod reference;

pub use levels::InventoryLevels;
pub use movement::{MovementStatus, MovementType};

use rust_decimal::Decimal;
use thiserror::Error;

/// Decimal places stored for quantities.
pub const QUANTITY_SCALE: u32 = 3;

/// Decimal places stored for unit costs and inventory values.
pub const COST_SCALE: u32 = 4;

/// Reject values with more decimal places than the column keeps, so a small
/// positive quantity is never stored as zero.
pub(crate) fn ensure_scale(field: &'static str, value: Decimal, places: u32) -> Result<(), StockError> {
    if value.normalize().scale() > places {
        return Err(StockError::TooPrecise { field, places });
    }
    Ok(())
}

/// Violations of the stock bookkeeping rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: Decimal, available: Decimal },

    #[error("Cannot release {requested}: only {reserved} reserved")]
    InsufficientReservation { requested: Decimal, reserved: Decimal },

    #[error("Quantity must be greater than zero")]
    NonPositiveQuantity,

    #[error("Adjustment quantity must not be zero")]
    ZeroAdjustment,

    #[error("Adjustment would leave quantity at {resulting}, below the {reserved} reserved")]
    AdjustmentBelowReserved { resulting: Decimal, reserved: Decimal },

    #[error("{field} must have at most {places} decimal places")]
    TooPrecise { field: &'static str, places: u32 },

    #[error("Unit cost must not be negative")]
    NegativeUnitCost,

    #[error("Cannot move a movement from {from} to {to}")]
    InvalidTransition { from: MovementStatus, to: MovementStatus },

    #[error("A movement cannot be created as {0}")]
    InvalidInitialStatus(MovementStatus),

    #[error("Movement {reference} is {status} and can no longer be {action}")]
    Locked {
        reference: String,
        status: MovementStatus,
        action: &'static str,
    },

    #[error("Transfers need a destination warehouse different from the source")]
    InvalidDestination,

    #[error("Only transfers can have a destination warehouse")]
    UnexpectedDestination,

    #[error("Inventory still holds stock and cannot be deleted")]
    InventoryNotEmpty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_scale() {
        assert!(ensure_scale("quantity", "1.250".parse().unwrap(), QUANTITY_SCALE).is_ok());
        // Trailing zeros do not count.
        assert!(ensure_scale("quantity", "2.0000000".parse().unwrap(), QUANTITY_SCALE).is_ok());
        assert_eq!(
            ensure_scale("quantity", "0.0001".parse().unwrap(), QUANTITY_SCALE),
            Err(StockError::TooPrecise {
                field: "quantity",
                places: 3
            })
        );
        assert_eq!(
            StockError::TooPrecise {
                field: "unit_cost",
                places: 4
            }
            .to_string(),
            "unit_cost must have at most 4 decimal places"
        );
    }
}
