//! Regex patterns for the supported invoice layout.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "$" followed by digits, optional point, optional fraction digits
    pub static ref DOLLAR_AMOUNT: Regex = Regex::new(
        r"\$(\d+\.?\d*)"
    ).unwrap();

    // Line-item table, from its header through the subtotal label
    pub static ref SERVICE_SECTION: Regex = Regex::new(
        r"(?s)Service Description.*?SUBTOTAL"
    ).unwrap();

    pub static ref LINE_ITEM: Regex = Regex::new(
        r"(MONTHLY COST|NEW ACCOUNT EQUIPMENT OR SPECIAL SERVICE)\s+(1\.00)\s+\$(\d+\.\d{2})"
    ).unwrap();
}
