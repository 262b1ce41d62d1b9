//! Inventory level arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};

use super::{COST_SCALE, QUANTITY_SCALE, StockError, ensure_scale};

/// Quantity, reservation and cost of one product in one warehouse.
///
/// `available` and `total_value` are always derived, never stored independently
/// of the three fields here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InventoryLevels {
    pub quantity: Decimal,
    pub reserved: Decimal,
    pub unit_cost: Decimal,
}

fn round_cost(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn ensure_positive(quantity: Decimal) -> Result<(), StockError> {
    if quantity <= Decimal::ZERO {
        return Err(StockError::NonPositiveQuantity);
    }
    ensure_scale("quantity", quantity, QUANTITY_SCALE)
}

impl InventoryLevels {
    pub fn new(quantity: Decimal, reserved: Decimal, unit_cost: Decimal) -> Self {
        Self {
            quantity,
            reserved,
            unit_cost,
        }
    }

    pub fn available(&self) -> Decimal {
        self.quantity - self.reserved
    }

    pub fn total_value(&self) -> Decimal {
        round_cost(self.quantity * self.unit_cost)
    }

    /// Add stock. When a cost is given the unit cost becomes the weighted average
    /// of the stock on hand and the received stock.
    pub fn receive(&mut self, quantity: Decimal, unit_cost: Option<Decimal>) -> Result<(), StockError> {
        ensure_positive(quantity)?;
        if let Some(cost) = unit_cost {
            if cost < Decimal::ZERO {
                return Err(StockError::NegativeUnitCost);
            }
            let on_hand_value = self.quantity * self.unit_cost;
            let new_quantity = self.quantity + quantity;
            self.unit_cost = round_cost((on_hand_value + quantity * cost) / new_quantity);
        }
        self.quantity += quantity;
        Ok(())
    }

    /// Remove stock that is not reserved.
    pub fn issue(&mut self, quantity: Decimal) -> Result<(), StockError> {
        ensure_positive(quantity)?;
        let available = self.available();
        if quantity > available {
            return Err(StockError::InsufficientStock {
                requested: quantity,
                available,
            });
        }
        self.quantity -= quantity;
        Ok(())
    }

    /// Apply a signed correction. Stock may not drop below what is reserved.
    pub fn adjust(&mut self, delta: Decimal) -> Result<(), StockError> {
        if delta.is_zero() {
            return Err(StockError::ZeroAdjustment);
        }
        let resulting = self.quantity + delta;
        if resulting < Decimal::ZERO || resulting < self.reserved {
            return Err(StockError::AdjustmentBelowReserved {
                resulting,
                reserved: self.reserved,
            });
        }
        self.quantity = resulting;
        Ok(())
    }

    pub fn reserve(&mut self, quantity: Decimal) -> Result<(), StockError> {
        ensure_positive(quantity)?;
        let available = self.available();
        if quantity > available {
            return Err(StockError::InsufficientStock {
                requested: quantity,
                available,
            });
        }
        self.reserved += quantity;
        Ok(())
    }

    pub fn release(&mut self, quantity: Decimal) -> Result<(), StockError> {
        ensure_positive(quantity)?;
        if quantity > self.reserved {
            return Err(StockError::InsufficientReservation {
                requested: quantity,
                reserved: self.reserved,
            });
        }
        self.reserved -= quantity;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.quantity.is_zero() && self.reserved.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_receive_into_empty_takes_cost() {
        let mut levels = InventoryLevels::default();
        levels.receive(dec("10"), Some(dec("2.50"))).unwrap();
        assert_eq!(levels.quantity, dec("10"));
        assert_eq!(levels.unit_cost, dec("2.5"));
        assert_eq!(levels.total_value(), dec("25"));
        assert_eq!(levels.available(), dec("10"));
    }

    #[test]
    fn test_receive_weighted_average_cost() {
        let mut levels = InventoryLevels::new(dec("10"), Decimal::ZERO, dec("2"));
        levels.receive(dec("30"), Some(dec("4"))).unwrap();
        // (10 * 2 + 30 * 4) / 40 = 3.5
        assert_eq!(levels.unit_cost, dec("3.5"));
        assert_eq!(levels.total_value(), dec("140"));
    }

    #[test]
    fn test_receive_without_cost_keeps_cost() {
        let mut levels = InventoryLevels::new(dec("4"), Decimal::ZERO, dec("1.25"));
        levels.receive(dec("4"), None).unwrap();
        assert_eq!(levels.unit_cost, dec("1.25"));
        assert_eq!(levels.total_value(), dec("10"));
    }

    #[test]
    fn test_issue_respects_reservations() {
        let mut levels = InventoryLevels::new(dec("10"), dec("4"), dec("1"));
        assert_eq!(
            levels.issue(dec("7")),
            Err(StockError::InsufficientStock {
                requested: dec("7"),
                available: dec("6"),
            })
        );
        assert_eq!(levels.quantity, dec("10"));

        levels.issue(dec("6")).unwrap();
        assert_eq!(levels.quantity, dec("4"));
        assert_eq!(levels.available(), Decimal::ZERO);
    }

    #[test]
    fn test_adjust_signed() {
        let mut levels = InventoryLevels::new(dec("5"), dec("2"), dec("1"));
        levels.adjust(dec("-3")).unwrap();
        assert_eq!(levels.quantity, dec("2"));
        assert!(matches!(
            levels.adjust(dec("-1")),
            Err(StockError::AdjustmentBelowReserved { .. })
        ));
        levels.adjust(dec("8")).unwrap();
        assert_eq!(levels.quantity, dec("10"));
        assert_eq!(levels.adjust(Decimal::ZERO), Err(StockError::ZeroAdjustment));
    }

    #[test]
    fn test_reserve_and_release() {
        let mut levels = InventoryLevels::new(dec("10"), Decimal::ZERO, Decimal::ZERO);
        levels.reserve(dec("3")).unwrap();
        assert_eq!(levels.available(), dec("7"));
        assert!(levels.reserve(dec("8")).is_err());
        assert!(matches!(
            levels.release(dec("4")),
            Err(StockError::InsufficientReservation { .. })
        ));
        levels.release(dec("3")).unwrap();
        assert!(levels.reserved.is_zero());
        assert!(!levels.is_empty());
    }

    #[test]
    fn test_non_positive_quantities_rejected() {
        let mut levels = InventoryLevels::default();
        assert_eq!(levels.receive(Decimal::ZERO, None), Err(StockError::NonPositiveQuantity));
        assert_eq!(levels.issue(dec("-1")), Err(StockError::NonPositiveQuantity));
        assert_eq!(levels.reserve(Decimal::ZERO), Err(StockError::NonPositiveQuantity));
    }

    #[test]
    fn test_reserve_rejects_sub_scale_quantity() {
        let mut levels = InventoryLevels::new(dec("5"), Decimal::ZERO, dec("1"));
        assert_eq!(
            levels.reserve(dec("0.0005")),
            Err(StockError::TooPrecise {
                field: "quantity",
                places: 3
            })
        );
        assert_eq!(levels.reserved, Decimal::ZERO);
    }
}
