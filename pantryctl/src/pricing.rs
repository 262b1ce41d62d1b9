//! Margin-based product pricing.

use rust_decimal::{Decimal, RoundingStrategy};

/// Selling prices are kept to cents.
pub const PRICE_SCALE: u32 = 2;

/// Apply a percentage markup to a cost.
///
/// `price = cost * (1 + percentage / 100)`, rounded half away from zero to
/// [`PRICE_SCALE`] places. The same formula is used by the SQL that re-prices
/// products when a margin level changes.
///
/// Returns `None` when the price does not fit in a [`Decimal`].
pub fn apply_margin(cost: Decimal, percentage: Decimal) -> Option<Decimal> {
    let markup = Decimal::ONE.checked_add(percentage.checked_div(Decimal::ONE_HUNDRED)?)?;
    let price = cost.checked_mul(markup)?;
    Some(price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// Resolve the stored selling price for a product.
///
/// A margin level always wins; otherwise an explicit price is kept, falling
/// back to the cost itself.
pub fn resolve_selling_price(cost: Decimal, margin_percentage: Option<Decimal>, explicit: Option<Decimal>) -> Option<Decimal> {
    match margin_percentage {
        Some(percentage) => apply_margin(cost, percentage),
        None => Some(
            explicit
                .unwrap_or(cost)
                .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero),
        ),
    }
}
