//! Data payload for the document generation template.
//!
//! Field names follow the merge template's tags exactly, so the
//! serialized form is the contract with the template author.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::invoice::PricedItem;

/// Root object merged into the invoice template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePayload {
    /// Line-item table.
    pub items: ItemTable,

    /// Pre-tax subtotal.
    pub subtotal: String,

    /// Sales tax line.
    pub tax: String,

    /// Amount paid (grand total).
    pub paid: String,
}

/// Wrapper matching the template's repeating table section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTable {
    #[serde(rename = "itemTable")]
    pub item_table: Vec<ItemRow>,
}

/// One row in the template's line-item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRow {
    pub service: String,
    pub quantity: String,
    pub price: String,
}

impl From<&PricedItem> for ItemRow {
    fn from(item: &PricedItem) -> Self {
        Self {
            service: item.description.clone(),
            quantity: money(item.quantity),
            price: money(item.base_price),
        }
    }
}

/// Render a decimal with exactly two fraction digits.
pub fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_pads_and_rounds() {
        assert_eq!(money(dec!(400)), "400.00");
        assert_eq!(money(dec!(35.5)), "35.50");
        assert_eq!(money(dec!(183.697)), "183.70");
    }

    #[test]
    fn test_payload_field_names() {
        let payload = MergePayload {
            items: ItemTable {
                item_table: vec![ItemRow::from(&PricedItem {
                    description: "MONTHLY COST".to_string(),
                    quantity: dec!(1.00),
                    base_price: dec!(200.00),
                })],
            },
            subtotal: "400.00".to_string(),
            tax: "35.50".to_string(),
            paid: "435.50".to_string(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "items": {
                    "itemTable": [
                        {"service": "MONTHLY COST", "quantity": "1.00", "price": "200.00"}
                    ]
                },
                "subtotal": "400.00",
                "tax": "35.50",
                "paid": "435.50"
            })
        );
    }
}
