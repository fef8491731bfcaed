//! Sales-tax arithmetic on tax-inclusive prices.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::invoice::{LineItem, PricedItem};

/// Round to cents, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Pre-tax price of a tax-inclusive amount, rounded to cents.
pub fn base_from_inclusive(amount: Decimal, rate: Decimal) -> Decimal {
    let divisor = Decimal::ONE + rate;
    if divisor.is_zero() {
        return round2(amount);
    }
    round2(amount / divisor)
}

/// Split a tax-inclusive amount into `(base, tax)`.
///
/// The base is rounded first and the tax is the rounded residual, so
/// `base + tax == amount` for any amount already in cents.
pub fn extract_tax_from_total(amount: Decimal, rate: Decimal) -> (Decimal, Decimal) {
    let base = base_from_inclusive(amount, rate);
    let tax = round2(amount - base);
    (base, tax)
}

/// Re-price tax-inclusive line items without tax.
///
/// Not idempotent: running it over its own output removes tax a second
/// time and under-prices every item.
pub fn strip_tax(items: &[LineItem], rate: Decimal) -> Vec<PricedItem> {
    items
        .iter()
        .map(|item| PricedItem {
            description: item.description.clone(),
            quantity: item.quantity,
            base_price: base_from_inclusive(item.tax_inclusive_price, rate),
        })
        .collect()
}
