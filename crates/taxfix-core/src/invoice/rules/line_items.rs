//! Line-item extraction from the service table.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::invoice::LineItem;

use super::amounts::parse_dollar_amount;
use super::patterns::{LINE_ITEM, SERVICE_SECTION};
use super::{ExtractionMatch, FieldExtractor};

/// Line-item extractor for the service table.
pub struct LineItemExtractor;

impl LineItemExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LineItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for LineItemExtractor {
    type Output = ExtractionMatch<LineItem>;

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let Some(section) = SERVICE_SECTION.find(text) else {
            debug!("No service section found");
            return Vec::new();
        };

        let mut results = Vec::new();
        for caps in LINE_ITEM.captures_iter(section.as_str()) {
            let (Some(full_match), Some(price)) = (caps.get(0), parse_dollar_amount(&caps[3]))
            else {
                continue;
            };
            let quantity = parse_dollar_amount(&caps[2]).unwrap_or(Decimal::ONE);

            let item = LineItem {
                description: caps[1].to_string(),
                quantity,
                tax_inclusive_price: price,
            };
            debug!("Found line item {:?} at ${}", item.description, item.tax_inclusive_price);

            let start = section.start() + full_match.start();
            let end = section.start() + full_match.end();
            results.push(ExtractionMatch::new(item, full_match.as_str()).with_position(start, end));
        }

        results
    }
}

/// Extract the service table's line items, in order.
pub fn extract_line_items(text: &str) -> Vec<LineItem> {
    LineItemExtractor::new()
        .extract_all(text)
        .into_iter()
        .map(|m| m.value)
        .collect()
}
