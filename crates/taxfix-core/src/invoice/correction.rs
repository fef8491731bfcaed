//! Correction planning: merge payload and change list for a regenerated invoice.

use rust_decimal::Decimal;

use crate::models::invoice::{LineItem, PricedItem, TaxAnalysis};
use crate::models::merge::{money, ItemRow, ItemTable, MergePayload};

use super::rules::amounts::format_dollar_amount;
use super::rules::tax::strip_tax;

/// Everything needed to regenerate one invoice.
#[derive(Debug, Clone)]
pub struct CorrectionPlan {
    /// Analysis the plan was built from.
    pub analysis: TaxAnalysis,
    /// Line items as printed on the source invoice.
    pub original_items: Vec<LineItem>,
    /// Line items re-priced without tax.
    pub repriced_items: Vec<PricedItem>,
}

impl CorrectionPlan {
    /// Build a plan from an analysis and the invoice's printed line items.
    ///
    /// Re-pricing uses the configured rate only, not the analysis figures.
    pub fn build(analysis: &TaxAnalysis, items: &[LineItem], rate: Decimal) -> Self {
        Self {
            analysis: analysis.clone(),
            original_items: items.to_vec(),
            repriced_items: strip_tax(items, rate),
        }
    }

    /// Data merged into the invoice template.
    pub fn payload(&self) -> MergePayload {
        MergePayload {
            items: ItemTable {
                item_table: self.repriced_items.iter().map(ItemRow::from).collect(),
            },
            subtotal: money(self.analysis.base_amount),
            tax: money(self.analysis.tax_amount),
            paid: money(self.analysis.total_amount),
        }
    }

    /// Human-readable list of what the regenerated invoice changes.
    pub fn changes(&self) -> Vec<String> {
        if !self.analysis.needs_fixing {
            return Vec::new();
        }

        let mut changes: Vec<String> = self
            .original_items
            .iter()
            .zip(&self.repriced_items)
            .map(|(original, fixed)| {
                format!(
                    "Line item \"{}\": {} -> {}",
                    fixed.description,
                    format_dollar_amount(original.tax_inclusive_price),
                    format_dollar_amount(fixed.base_price)
                )
            })
            .collect();

        changes.push(format!(
            "Updated subtotal to {}",
            format_dollar_amount(self.analysis.base_amount)
        ));
        changes.push(format!(
            "Added sales tax line of {}",
            format_dollar_amount(self.analysis.tax_amount)
        ));
        changes.push(format!(
            "Total remains {}",
            format_dollar_amount(self.analysis.total_amount)
        ));
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn hidden_tax_analysis() -> TaxAnalysis {
        TaxAnalysis {
            base_amount: dec!(400.00),
            tax_amount: dec!(35.50),
            total_amount: dec!(435.50),
            tax_rate: dec!(8.875),
            needs_fixing: true,
        }
    }

    fn items() -> Vec<LineItem> {
        vec![
            LineItem::new("MONTHLY COST", dec!(217.75)),
            LineItem::new("NEW ACCOUNT EQUIPMENT OR SPECIAL SERVICE", dec!(217.75)),
        ]
    }

    #[test]
    fn test_payload() {
        let plan = CorrectionPlan::build(&hidden_tax_analysis(), &items(), dec!(0.08875));
        let payload = plan.payload();

        assert_eq!(payload.subtotal, "400.00");
        assert_eq!(payload.tax, "35.50");
        assert_eq!(payload.paid, "435.50");
        assert_eq!(
            payload.items.item_table,
            vec![
                ItemRow {
                    service: "MONTHLY COST".to_string(),
                    quantity: "1.00".to_string(),
                    price: "200.00".to_string(),
                },
                ItemRow {
                    service: "NEW ACCOUNT EQUIPMENT OR SPECIAL SERVICE".to_string(),
                    quantity: "1.00".to_string(),
                    price: "200.00".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_changes() {
        let plan = CorrectionPlan::build(&hidden_tax_analysis(), &items(), dec!(0.08875));
        assert_eq!(
            plan.changes(),
            vec![
                "Line item \"MONTHLY COST\": $217.75 -> $200.00".to_string(),
                "Line item \"NEW ACCOUNT EQUIPMENT OR SPECIAL SERVICE\": $217.75 -> $200.00"
                    .to_string(),
                "Updated subtotal to $400.00".to_string(),
                "Added sales tax line of $35.50".to_string(),
                "Total remains $435.50".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_changes_when_correct() {
        let mut analysis = hidden_tax_analysis();
        analysis.needs_fixing = false;
        let plan = CorrectionPlan::build(&analysis, &items(), dec!(0.08875));
        assert!(plan.changes().is_empty());
    }

    #[test]
    fn test_payload_without_items() {
        let plan = CorrectionPlan::build(&hidden_tax_analysis(), &[], dec!(0.08875));
        let payload = plan.payload();
        assert!(payload.items.item_table.is_empty());
        assert_eq!(payload.tax, "35.50");
    }
}
