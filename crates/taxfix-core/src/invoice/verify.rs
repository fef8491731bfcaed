//! Arithmetic checks on a regenerated invoice.
//!
//! A regenerated invoice prints six amounts: both line items, the
//! subtotal, the tax line, the amount paid and the amount due.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ReconcileError;
use crate::models::invoice::CENT;

use super::rules::amounts::ParsedAmounts;

const LINE_ONE: usize = 0;
const LINE_TWO: usize = 1;
const SUBTOTAL: usize = 2;
const TAX: usize = 3;
const PAID: usize = 4;
const DUE: usize = 5;
const REQUIRED: usize = DUE + 1;

/// Result of checking a regenerated invoice's figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub line_items: [Decimal; 2],
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub paid: Decimal,
    pub due: Decimal,
    /// Line items add up to the subtotal.
    pub subtotal_matches: bool,
    /// Tax as a percentage of the subtotal.
    pub effective_rate: Decimal,
    /// Effective rate equals the configured rate to three places.
    pub rate_matches: bool,
    /// Subtotal plus tax equals the amount due.
    pub total_matches: bool,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.subtotal_matches && self.rate_matches && self.total_matches
    }
}

/// Check a regenerated invoice's amounts against a tax rate (as a fraction).
pub fn verify_amounts(amounts: &ParsedAmounts, rate: Decimal) -> Result<Verification, ReconcileError> {
    if amounts.len() < REQUIRED {
        return Err(ReconcileError::InsufficientData {
            found: amounts.len(),
            required: REQUIRED,
        });
    }
    let at = |i: usize| amounts.get(i).unwrap_or_default();

    let line_items = [at(LINE_ONE), at(LINE_TWO)];
    let subtotal = at(SUBTOTAL);
    let tax = at(TAX);
    let due = at(DUE);

    let items_total = line_items[0]
        .checked_add(line_items[1])
        .ok_or(ReconcileError::AmountOutOfRange(line_items[1]))?;
    let expected_due = subtotal.checked_add(tax).ok_or(ReconcileError::AmountOutOfRange(tax))?;

    let effective_rate = if subtotal.is_zero() {
        Decimal::ZERO
    } else {
        tax.checked_div(subtotal)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or(ReconcileError::AmountOutOfRange(tax))?
    };
    let expected_rate = rate * Decimal::ONE_HUNDRED;

    Ok(Verification {
        line_items,
        subtotal,
        tax,
        paid: at(PAID),
        due,
        subtotal_matches: within_cent(items_total, subtotal),
        effective_rate,
        rate_matches: effective_rate.round_dp(3) == expected_rate.round_dp(3),
        total_matches: within_cent(expected_due, due),
    })
}

fn within_cent(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b).is_some_and(|diff| diff.abs() <= CENT)
}
