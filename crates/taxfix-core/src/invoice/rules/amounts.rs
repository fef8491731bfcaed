//! Dollar amount extraction.
//!
//! The scan is purely lexical: every `$<digits>[.<digits>]` token becomes
//! one amount, in the order it appears. Interpreting what each position
//! means is left to [`ParsedAmounts`]'s accessors.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use super::patterns::DOLLAR_AMOUNT;
use super::{ExtractionMatch, FieldExtractor};

/// Dollar amount extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in DOLLAR_AMOUNT.captures_iter(text) {
            let Some(full_match) = caps.get(0) else {
                continue;
            };
            match parse_dollar_amount(&caps[1]) {
                Some(amount) => results.push(
                    ExtractionMatch::new(amount, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                ),
                None => trace!("Dropping malformed amount token {:?}", full_match.as_str()),
            }
        }

        results
    }
}

/// Amounts in the order they appear in the document text.
///
/// The supported invoice layout prints, in order: the first monthly charge,
/// the second monthly charge, the subtotal, the tax line, and the grand
/// total. Only the accessors below know those positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAmounts {
    amounts: Vec<Decimal>,
}

impl ParsedAmounts {
    /// Position of the first (tax-inclusive) monthly charge.
    pub const MONTHLY_CHARGE: usize = 0;
    /// Position of the displayed tax line.
    pub const DISPLAYED_TAX: usize = 3;
    /// Position of the displayed grand total.
    pub const GRAND_TOTAL: usize = 4;
    /// Amounts needed before any position can be trusted.
    pub const REQUIRED: usize = Self::GRAND_TOTAL + 1;

    pub fn new(amounts: Vec<Decimal>) -> Self {
        Self { amounts }
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn as_slice(&self) -> &[Decimal] {
        &self.amounts
    }

    pub fn get(&self, index: usize) -> Option<Decimal> {
        self.amounts.get(index).copied()
    }

    /// First monthly charge.
    pub fn monthly_charge(&self) -> Option<Decimal> {
        self.get(Self::MONTHLY_CHARGE)
    }

    /// Tax line as printed (zero on invoices with hidden tax).
    pub fn displayed_tax_line(&self) -> Option<Decimal> {
        self.get(Self::DISPLAYED_TAX)
    }

    /// Grand total as printed.
    pub fn grand_total(&self) -> Option<Decimal> {
        self.get(Self::GRAND_TOTAL)
    }
}

impl FromIterator<Decimal> for ParsedAmounts {
    fn from_iter<I: IntoIterator<Item = Decimal>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Extract all dollar amounts from document text, in order.
pub fn extract_amounts(text: &str) -> ParsedAmounts {
    AmountExtractor::new()
        .extract_all(text)
        .into_iter()
        .map(|m| m.value)
        .collect()
}

/// Parse a dollar token such as `$435.50`, `435.50` or `$12.`.
pub fn parse_dollar_amount(s: &str) -> Option<Decimal> {
    let digits = s.trim().trim_start_matches('$').trim_end_matches('.');
    if digits.is_empty() {
        return None;
    }
    Decimal::from_str(digits).ok()
}

/// Format an amount as `$1234.56`.
pub fn format_dollar_amount(amount: Decimal) -> String {
    format!("${}", crate::models::merge::money(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const INVOICE_TEXT: &str = "Liberty Pest Control Invoice #: 1148151 \
        Service Description Quantity Price MONTHLY COST 1.00 $217.75 \
        NEW ACCOUNT EQUIPMENT OR SPECIAL SERVICE 1.00 $217.75 SUBTOTAL $435.50 \
        SALES TAX $0.00 TOTAL $435.50 AMOUNT PAID $0.00";

    #[test]
    fn test_extract_amounts_in_order() {
        let amounts = extract_amounts(INVOICE_TEXT);
        assert_eq!(
            amounts.as_slice(),
            &[
                dec!(217.75),
                dec!(217.75),
                dec!(435.50),
                dec!(0.00),
                dec!(435.50),
                dec!(0.00)
            ]
        );
    }

    #[test]
    fn test_positional_accessors() {
        let amounts = extract_amounts(INVOICE_TEXT);
        assert_eq!(amounts.monthly_charge(), Some(dec!(217.75)));
        assert_eq!(amounts.displayed_tax_line(), Some(dec!(0.00)));
        assert_eq!(amounts.grand_total(), Some(dec!(435.50)));
    }

    #[test]
    fn test_accessors_on_short_sequence() {
        let amounts = ParsedAmounts::new(vec![dec!(1), dec!(2), dec!(3)]);
        assert_eq!(amounts.monthly_charge(), Some(dec!(1)));
        assert_eq!(amounts.displayed_tax_line(), None);
        assert_eq!(amounts.grand_total(), None);
    }

    #[test]
    fn test_no_amounts() {
        let amounts = extract_amounts("No prices on this page. Total: 12.00 USD");
        assert!(amounts.is_empty());
    }

    #[test]
    fn test_duplicates_pass_through() {
        let amounts = extract_amounts("$5 $5 $5");
        assert_eq!(amounts.as_slice(), &[dec!(5), dec!(5), dec!(5)]);
    }

    #[test]
    fn test_token_shapes() {
        let extractor = AmountExtractor::new();
        let results = extractor.extract_all("a $12. b $7 c $0.009 d $ e $1,234.56");

        let values: Vec<Decimal> = results.iter().map(|m| m.value).collect();
        // "$1,234.56" stops at the comma
        assert_eq!(values, vec![dec!(12), dec!(7), dec!(0.009), dec!(1)]);
        assert_eq!(results[0].source, "$12.");
    }

    #[test]
    fn test_match_positions() {
        let extractor = AmountExtractor::new();
        let first = extractor.extract("Paid: $10.00").unwrap();
        assert_eq!(first.position, Some((6, 12)));
    }

    #[test]
    fn test_malformed_token_is_dropped() {
        let text = "$1.00 $99999999999999999999999999999999999999 $2.00";
        let amounts = extract_amounts(text);
        assert_eq!(amounts.as_slice(), &[dec!(1.00), dec!(2.00)]);
    }

    #[test]
    fn test_parse_dollar_amount() {
        assert_eq!(parse_dollar_amount("$435.50"), Some(dec!(435.50)));
        assert_eq!(parse_dollar_amount("435.50"), Some(dec!(435.50)));
        assert_eq!(parse_dollar_amount("$12."), Some(dec!(12)));
        assert_eq!(parse_dollar_amount("$"), None);
        assert_eq!(parse_dollar_amount("$abc"), None);
    }

    #[test]
    fn test_format_dollar_amount() {
        assert_eq!(format_dollar_amount(dec!(35.5)), "$35.50");
        assert_eq!(format_dollar_amount(dec!(0)), "$0.00");
    }
}
