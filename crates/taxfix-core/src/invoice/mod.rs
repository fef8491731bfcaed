//! Invoice analysis: amount parsing, tax reconciliation, correction planning.

mod correction;
mod reconcile;
pub mod rules;
mod verify;

pub use correction::CorrectionPlan;
pub use reconcile::{needs_fixing, TaxReconciler};
pub use rules::amounts::ParsedAmounts;
pub use verify::{verify_amounts, Verification};

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::ReconcileError;
use crate::models::invoice::TaxAnalysis;

use rules::{extract_amounts, extract_line_items};

/// What to do with one extracted document.
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    /// Tax is shown on its own line; nothing to regenerate.
    Correct(TaxAnalysis),
    /// Tax is folded into the line items; regenerate from the plan.
    NeedsFixing(CorrectionPlan),
    /// The document could not be reconciled and should be skipped.
    Skipped(ReconcileError),
}

impl DocumentOutcome {
    /// The tax analysis, unless the document was skipped.
    pub fn analysis(&self) -> Option<&TaxAnalysis> {
        match self {
            Self::Correct(analysis) => Some(analysis),
            Self::NeedsFixing(plan) => Some(&plan.analysis),
            Self::Skipped(_) => None,
        }
    }
}

/// Run the whole text-to-decision pipeline for one document.
///
/// `rate` is the configured sales-tax rate as a fraction.
pub fn analyze_text(text: &str, rate: Decimal) -> DocumentOutcome {
    let amounts = extract_amounts(text);
    let reconciler = TaxReconciler::new(rate);

    match reconciler.reconcile(&amounts) {
        Ok(analysis) if analysis.needs_fixing => {
            let items = extract_line_items(text);
            if items.is_empty() {
                warn!("Tax is hidden but no line items were found; item table will be empty");
            }
            info!(
                "Hidden tax found: ${} base + ${} tax",
                analysis.base_amount, analysis.tax_amount
            );
            DocumentOutcome::NeedsFixing(CorrectionPlan::build(&analysis, &items, reconciler.rate()))
        }
        Ok(analysis) => {
            info!("Tax already separated at {}%", analysis.tax_rate.round_dp(3));
            DocumentOutcome::Correct(analysis)
        }
        Err(e) => {
            warn!("Skipping document: {}", e);
            DocumentOutcome::Skipped(e)
        }
    }
}
