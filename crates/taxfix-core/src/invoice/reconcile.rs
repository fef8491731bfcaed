//! Tax reconciliation for invoices whose tax may be hidden in line items.
//!
//! The supported layout bills two identical monthly charges. A displayed
//! tax line under one cent is read as "tax was never separated out": the
//! charges are assumed tax-inclusive and split back into base and tax at
//! the configured rate. Any other tax line is trusted as printed.
//!
//! This heuristic describes one invoice template. It is not a general tax
//! detector.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ReconcileError;
use crate::models::invoice::{TaxAnalysis, CENT};

use super::rules::amounts::ParsedAmounts;
use super::rules::tax::extract_tax_from_total;

/// Reconciles parsed amounts against a configured sales-tax rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxReconciler {
    /// Tax rate as a fraction.
    rate: Decimal,
}

impl TaxReconciler {
    /// Create a reconciler for a tax rate given as a fraction (0.08875).
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }

    /// Configured tax rate as a fraction.
    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Decide whether the invoice hides tax and compute its breakdown.
    pub fn reconcile(&self, amounts: &ParsedAmounts) -> Result<TaxAnalysis, ReconcileError> {
        let (Some(monthly_charge), Some(displayed_tax), Some(grand_total)) = (
            amounts.monthly_charge(),
            amounts.displayed_tax_line(),
            amounts.grand_total(),
        ) else {
            return Err(ReconcileError::InsufficientData {
                found: amounts.len(),
                required: ParsedAmounts::REQUIRED,
            });
        };

        debug!(
            "Monthly charge ${}, tax line ${}, total ${}",
            monthly_charge, displayed_tax, grand_total
        );

        let analysis = if needs_fixing(displayed_tax) {
            let (base, tax) = extract_tax_from_total(monthly_charge, self.rate);
            TaxAnalysis {
                base_amount: double(base)?,
                tax_amount: double(tax)?,
                total_amount: grand_total,
                tax_rate: self.rate * Decimal::ONE_HUNDRED,
                needs_fixing: true,
            }
        } else {
            let base_amount = double(monthly_charge)?;
            // Effective rate from the document, not the configured one
            let tax_rate = if base_amount.is_zero() {
                Decimal::ZERO
            } else {
                displayed_tax
                    .checked_div(base_amount)
                    .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
                    .ok_or(ReconcileError::AmountOutOfRange(displayed_tax))?
            };
            TaxAnalysis {
                base_amount,
                tax_amount: displayed_tax,
                total_amount: grand_total,
                tax_rate,
                needs_fixing: false,
            }
        };

        // Monthly and combined figures must stay representable
        analysis
            .base_amount
            .checked_add(analysis.tax_amount)
            .ok_or(ReconcileError::AmountOutOfRange(analysis.tax_amount))?;

        Ok(analysis)
    }
}

fn double(amount: Decimal) -> Result<Decimal, ReconcileError> {
    amount
        .checked_mul(Decimal::TWO)
        .ok_or(ReconcileError::AmountOutOfRange(amount))
}

/// A tax line under one cent means tax was folded into the charges.
pub fn needs_fixing(displayed_tax: Decimal) -> bool {
    displayed_tax.abs() < CENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn reconciler() -> TaxReconciler {
        TaxReconciler::new(dec!(0.08875))
    }

    fn amounts(values: &[Decimal]) -> ParsedAmounts {
        values.iter().copied().collect()
    }

    #[test]
    fn test_insufficient_data() {
        for n in 0..5 {
            let values = vec![dec!(1.00); n];
            assert_eq!(
                reconciler().reconcile(&amounts(&values)),
                Err(ReconcileError::InsufficientData { found: n, required: 5 })
            );
        }
    }

    #[test]
    fn test_hidden_tax_is_split_out() {
        let parsed = amounts(&[dec!(200.00), dec!(200.00), dec!(35.50), dec!(0.00), dec!(435.50)]);
        let analysis = reconciler().reconcile(&parsed).unwrap();

        assert!(analysis.needs_fixing);
        assert_eq!(analysis.monthly_base(), dec!(183.70));
        assert_eq!(analysis.monthly_tax(), dec!(16.30));
        assert_eq!(analysis.base_amount, dec!(367.40));
        assert_eq!(analysis.tax_amount, dec!(32.60));
        assert_eq!(analysis.total_amount, dec!(435.50));
        assert_eq!(analysis.tax_rate, dec!(8.875));
    }

    #[test]
    fn test_hidden_tax_reference_invoice() {
        let parsed = amounts(&[dec!(217.75), dec!(217.75), dec!(435.50), dec!(0.00), dec!(435.50)]);
        let analysis = reconciler().reconcile(&parsed).unwrap();

        assert_eq!(
            analysis,
            TaxAnalysis {
                base_amount: dec!(400.00),
                tax_amount: dec!(35.50),
                total_amount: dec!(435.50),
                tax_rate: dec!(8.875),
                needs_fixing: true,
            }
        );
        assert!(analysis.is_balanced());
    }

    #[test]
    fn test_separated_tax_passes_through() {
        let parsed = amounts(&[dec!(200.00), dec!(200.00), dec!(35.50), dec!(35.50), dec!(435.50)]);
        let analysis = reconciler().reconcile(&parsed).unwrap();

        assert_eq!(
            analysis,
            TaxAnalysis {
                base_amount: dec!(400.00),
                tax_amount: dec!(35.50),
                total_amount: dec!(435.50),
                tax_rate: dec!(8.875),
                needs_fixing: false,
            }
        );
    }

    #[test]
    fn test_pass_through_uses_effective_rate() {
        // Configured rate is ignored when the document shows its own tax
        let parsed = amounts(&[dec!(100.00), dec!(100.00), dec!(200.00), dec!(10.00), dec!(210.00)]);
        let analysis = reconciler().reconcile(&parsed).unwrap();

        assert!(!analysis.needs_fixing);
        assert_eq!(analysis.tax_rate, dec!(5));
        assert_eq!(analysis.tax_amount, dec!(10.00));
    }

    #[test]
    fn test_pass_through_zero_charge() {
        let parsed = amounts(&[dec!(0.00), dec!(0.00), dec!(0.00), dec!(1.00), dec!(1.00)]);
        let analysis = reconciler().reconcile(&parsed).unwrap();

        assert!(!analysis.needs_fixing);
        assert_eq!(analysis.tax_rate, Decimal::ZERO);
    }

    #[test]
    fn test_threshold_below_one_cent() {
        let parsed = amounts(&[dec!(217.75), dec!(217.75), dec!(435.50), dec!(0.009), dec!(435.50)]);
        assert!(reconciler().reconcile(&parsed).unwrap().needs_fixing);
    }

    #[test]
    fn test_threshold_at_one_cent() {
        let parsed = amounts(&[dec!(217.75), dec!(217.75), dec!(435.50), dec!(0.01), dec!(435.50)]);
        let analysis = reconciler().reconcile(&parsed).unwrap();
        assert!(!analysis.needs_fixing);
        assert_eq!(analysis.tax_amount, dec!(0.01));
    }

    #[test]
    fn test_correction_is_a_fixed_point() {
        let original = amounts(&[dec!(217.75), dec!(217.75), dec!(435.50), dec!(0.00), dec!(435.50)]);
        let fixed = reconciler().reconcile(&original).unwrap();

        // Amounts as they appear on the regenerated invoice
        let regenerated = amounts(&[
            fixed.monthly_base(),
            fixed.monthly_base(),
            fixed.base_amount,
            fixed.tax_amount,
            fixed.total_amount,
        ]);
        let again = reconciler().reconcile(&regenerated).unwrap();

        assert!(!again.needs_fixing);
        assert_eq!(again.base_amount, fixed.base_amount);
        assert_eq!(again.tax_amount, fixed.tax_amount);
        assert_eq!(again.total_amount, fixed.total_amount);
    }

    #[test]
    fn test_extra_amounts_are_ignored() {
        let parsed = amounts(&[
            dec!(217.75),
            dec!(217.75),
            dec!(435.50),
            dec!(0.00),
            dec!(435.50),
            dec!(0.00),
            dec!(999.99),
        ]);
        let analysis = reconciler().reconcile(&parsed).unwrap();
        assert_eq!(analysis.total_amount, dec!(435.50));
    }

    #[test]
    fn test_correction_overflow_is_an_error() {
        let parsed = amounts(&[Decimal::MAX, dec!(1), dec!(1), dec!(0.00), dec!(10.00)]);
        assert!(matches!(
            reconciler().reconcile(&parsed),
            Err(ReconcileError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn test_pass_through_overflow_is_an_error() {
        let parsed = amounts(&[Decimal::MAX, dec!(1), dec!(1), dec!(5.00), dec!(10.00)]);
        assert_eq!(
            reconciler().reconcile(&parsed),
            Err(ReconcileError::AmountOutOfRange(Decimal::MAX))
        );
    }

    #[test]
    fn test_huge_tax_line_is_an_error() {
        let parsed = amounts(&[dec!(0.01), dec!(0.01), dec!(0.02), Decimal::MAX, dec!(10.00)]);
        assert!(matches!(
            reconciler().reconcile(&parsed),
            Err(ReconcileError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn test_other_rate_is_substitutable() {
        let parsed = amounts(&[dec!(106.25), dec!(106.25), dec!(212.50), dec!(0.00), dec!(212.50)]);
        let analysis = TaxReconciler::new(dec!(0.0625)).reconcile(&parsed).unwrap();

        assert_eq!(analysis.base_amount, dec!(200.00));
        assert_eq!(analysis.tax_amount, dec!(12.50));
        assert_eq!(analysis.tax_rate, dec!(6.25));
    }
}
