//! Movement types and the movement status lifecycle.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{COST_SCALE, QUANTITY_SCALE, StockError, ensure_scale};

/// What a stock movement does to inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Incoming,
    Outgoing,
    Adjustment,
    Transfer,
    Return,
}

impl MovementType {
    /// Prefix used in reference numbers, e.g. `IN-20250301-0001`.
    pub fn prefix(&self) -> &'static str {
        match self {
            MovementType::Incoming => "IN",
            MovementType::Outgoing => "OUT",
            MovementType::Adjustment => "ADJ",
            MovementType::Transfer => "TRF",
            MovementType::Return => "RET",
        }
    }

    /// Check quantity, cost and destination against the rules for this type.
    ///
    /// Adjustments carry a signed delta; every other type moves a positive quantity.
    pub fn validate(
        &self,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
        has_distinct_destination: Option<bool>,
    ) -> Result<(), StockError> {
        match self {
            MovementType::Adjustment if quantity.is_zero() => return Err(StockError::ZeroAdjustment),
            MovementType::Adjustment => {}
            _ if quantity <= Decimal::ZERO => return Err(StockError::NonPositiveQuantity),
            _ => {}
        }
        ensure_scale("quantity", quantity, QUANTITY_SCALE)?;

        if let Some(cost) = unit_cost {
            if cost < Decimal::ZERO {
                return Err(StockError::NegativeUnitCost);
            }
            ensure_scale("unit_cost", cost, COST_SCALE)?;
        }

        match (self, has_distinct_destination) {
            (MovementType::Transfer, Some(true)) => Ok(()),
            (MovementType::Transfer, _) => Err(StockError::InvalidDestination),
            (_, Some(_)) => Err(StockError::UnexpectedDestination),
            (_, None) => Ok(()),
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MovementType::Incoming => "INCOMING",
            MovementType::Outgoing => "OUTGOING",
            MovementType::Adjustment => "ADJUSTMENT",
            MovementType::Transfer => "TRANSFER",
            MovementType::Return => "RETURN",
        };
        f.write_str(s)
    }
}

/// Where a movement is in its lifecycle.
///
/// ```text
/// DRAFT → PLANNED → IN_PROGRESS → COMPLETED
///   └────────┴──────────┴───────→ CANCELLED
/// ```
///
/// Forward jumps (e.g. DRAFT → COMPLETED) are allowed. COMPLETED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementStatus {
    Draft,
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl MovementStatus {
    fn rank(&self) -> u8 {
        match self {
            MovementStatus::Draft => 0,
            MovementStatus::Planned => 1,
            MovementStatus::InProgress => 2,
            MovementStatus::Completed => 3,
            MovementStatus::Cancelled => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MovementStatus::Completed | MovementStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: MovementStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            MovementStatus::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }

    pub fn transition_to(&self, next: MovementStatus) -> Result<MovementStatus, StockError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StockError::InvalidTransition { from: *self, to: next })
        }
    }

    /// Statuses a movement may be created in.
    pub fn is_valid_initial(&self) -> bool {
        !matches!(self, MovementStatus::Cancelled)
    }

    /// Movement fields can only be edited before work on them has started.
    pub fn is_editable(&self) -> bool {
        matches!(self, MovementStatus::Draft | MovementStatus::Planned)
    }

    /// Completed movements are part of the inventory history and are never deleted.
    pub fn is_deletable(&self) -> bool {
        matches!(self, MovementStatus::Draft | MovementStatus::Cancelled)
    }
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MovementStatus::Draft => "DRAFT",
            MovementStatus::Planned => "PLANNED",
            MovementStatus::InProgress => "IN_PROGRESS",
            MovementStatus::Completed => "COMPLETED",
            MovementStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}
