use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::form::LoanApplicationForm;
use crate::analytics::{analyze_dscr, DscrAnalyticsInput, DscrMetrics};
use crate::pricing::{price_loan, PricingOutput, PricingRequest};
use crate::rate_table::book::RateBook;
use crate::types::{with_metadata, ComputationOutput};
use crate::PricingResult;

/// Portal quote: the normalized request, its pricing, and cash-flow metrics
/// for the best option when the form carries the cash invested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub request: PricingRequest,
    pub pricing: PricingOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<DscrMetrics>,
}

pub fn quote_application(
    form: &LoanApplicationForm,
    book: &RateBook,
) -> PricingResult<ComputationOutput<Quote>> {
    let start = Instant::now();
    let request = form.normalize()?;
    let priced = price_loan(&request, book)?;
    let mut warnings = priced.warnings;
    let pricing = priced.result;

    let analytics = match (pricing.best(), form.cash_invested()?) {
        (Some(best), Some((down_payment, closing_costs))) => {
            let input =
                DscrAnalyticsInput::from_pricing(&request.input, best, down_payment, closing_costs)?;
            let analyzed = analyze_dscr(&input)?;
            warnings.extend(analyzed.warnings);
            Some(analyzed.result)
        }
        _ => None,
    };

    let assumptions = serde_json::json!({
        "fico": "bucket lower bound + 5",
        "ltv": "loan_amount / estimated_home_value",
        "analytics_option": "lowest final rate",
    });
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Portal application quote",
        &assumptions,
        warnings,
        elapsed,
        Quote {
            request,
            pricing,
            analytics,
        },
    ))
}
