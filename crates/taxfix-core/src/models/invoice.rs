//! Invoice data models: line items and tax analysis results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing currency figures.
pub const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// A line item as printed on the invoice, price possibly tax-inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Service description.
    pub description: String,

    /// Quantity.
    pub quantity: Decimal,

    /// Price as displayed, which may already contain sales tax.
    pub tax_inclusive_price: Decimal,
}

impl LineItem {
    pub fn new(description: impl Into<String>, tax_inclusive_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity: Decimal::ONE,
            tax_inclusive_price,
        }
    }
}

/// A line item re-priced without tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedItem {
    /// Service description.
    pub description: String,

    /// Quantity.
    pub quantity: Decimal,

    /// Pre-tax price.
    pub base_price: Decimal,
}

impl PricedItem {
    /// Treat this re-priced item as a displayed line item again.
    pub fn as_line_item(&self) -> LineItem {
        LineItem {
            description: self.description.clone(),
            quantity: self.quantity,
            tax_inclusive_price: self.base_price,
        }
    }
}

/// Outcome of reconciling an invoice's displayed amounts.
///
/// `base_amount` and `tax_amount` cover both monthly charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxAnalysis {
    /// Pre-tax total across both monthly charges.
    pub base_amount: Decimal,

    /// Tax total across both monthly charges.
    pub tax_amount: Decimal,

    /// Grand total as displayed on the invoice.
    pub total_amount: Decimal,

    /// Tax rate in percent (8.875, not 0.08875).
    pub tax_rate: Decimal,

    /// Whether tax was hidden in the line items.
    pub needs_fixing: bool,
}

impl TaxAnalysis {
    /// Pre-tax amount of a single monthly charge.
    pub fn monthly_base(&self) -> Decimal {
        self.base_amount / Decimal::TWO
    }

    /// Tax on a single monthly charge.
    pub fn monthly_tax(&self) -> Decimal {
        self.tax_amount / Decimal::TWO
    }

    /// A single monthly charge including tax.
    pub fn monthly_total(&self) -> Decimal {
        self.monthly_base() + self.monthly_tax()
    }

    /// Check that base plus tax reconstructs the total within a cent.
    pub fn is_balanced(&self) -> bool {
        (self.base_amount + self.tax_amount - self.total_amount).abs() <= CENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cent_constant() {
        assert_eq!(CENT, dec!(0.01));
    }

    #[test]
    fn test_monthly_breakdown() {
        let analysis = TaxAnalysis {
            base_amount: dec!(400.00),
            tax_amount: dec!(35.50),
            total_amount: dec!(435.50),
            tax_rate: dec!(8.875),
            needs_fixing: true,
        };

        assert_eq!(analysis.monthly_base(), dec!(200.00));
        assert_eq!(analysis.monthly_tax(), dec!(17.75));
        assert_eq!(analysis.monthly_total(), dec!(217.75));
        assert!(analysis.is_balanced());
    }

    #[test]
    fn test_unbalanced_analysis() {
        let analysis = TaxAnalysis {
            base_amount: dec!(367.40),
            tax_amount: dec!(32.60),
            total_amount: dec!(435.50),
            tax_rate: dec!(8.875),
            needs_fixing: true,
        };
        assert!(!analysis.is_balanced());
    }
}
