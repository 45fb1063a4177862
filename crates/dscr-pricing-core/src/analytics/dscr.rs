use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{annual_debt_service, monthly_payment, MAX_NOTE_RATE, MAX_TERM_YEARS};
use crate::error::PricingError;
use crate::pricing::{LoanOption, PricingInput};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Ratio, MAX_AMOUNT};
use crate::PricingResult;

/// Payment drift tolerated between a stored option and the recomputed payment.
const PAYMENT_TOLERANCE: Money = dec!(0.01);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The loan terms analytics needs. A serialized [`LoanOption`] deserializes
/// into this directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancedLoan {
    pub loan_amount: Money,
    pub final_rate: Percent,
    pub term_years: u32,
    #[serde(default)]
    pub interest_only: bool,
    /// Payment quoted with the option, checked against the recomputed value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_payment: Option<Money>,
}

impl From<&LoanOption> for FinancedLoan {
    fn from(option: &LoanOption) -> Self {
        FinancedLoan {
            loan_amount: option.loan_amount,
            final_rate: option.final_rate,
            term_years: option.term_years,
            interest_only: option.interest_only,
            monthly_payment: Some(option.monthly_payment),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrAnalyticsInput {
    pub option: FinancedLoan,
    pub monthly_rental_income: Money,
    #[serde(default)]
    pub annual_property_insurance: Money,
    #[serde(default)]
    pub annual_property_taxes: Money,
    #[serde(default)]
    pub monthly_hoa_fee: Money,
    pub estimated_home_value: Money,
    pub down_payment: Money,
    #[serde(default)]
    pub closing_costs: Money,
}

impl DscrAnalyticsInput {
    /// Analytics input for an option priced from `input`. The pricing input
    /// supplies the property cash flows; the cash invested is not part of a
    /// pricing request and is passed explicitly.
    pub fn from_pricing(
        input: &PricingInput,
        option: &LoanOption,
        down_payment: Money,
        closing_costs: Money,
    ) -> PricingResult<Self> {
        let estimated_home_value = input.estimated_home_value.ok_or_else(|| {
            PricingError::invalid(
                "estimated_home_value",
                "Property value is required for cash-flow analytics",
            )
        })?;
        Ok(DscrAnalyticsInput {
            option: FinancedLoan::from(option),
            monthly_rental_income: input.monthly_rental_income,
            annual_property_insurance: input.annual_property_insurance,
            annual_property_taxes: input.annual_property_taxes,
            monthly_hoa_fee: input.monthly_hoa_fee,
            estimated_home_value,
            down_payment,
            closing_costs,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrMetrics {
    pub annual_rental_income: Money,
    pub annual_operating_expenses: Money,
    pub noi: Money,
    pub monthly_payment: Money,
    /// Annual debt service
    pub debt_service: Money,
    pub dscr: Ratio,
    /// NOI / property value, in percent
    pub cap_rate: Ratio,
    pub cash_flow: Money,
    pub total_cash_invested: Money,
    /// Cash flow / cash invested, in percent
    pub cash_on_cash_return: Ratio,
    pub break_even_ratio: Ratio,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Cash-flow metrics for a chosen loan option. Zero denominators yield
/// [`Ratio::Undefined`] rather than an error.
pub fn analyze_dscr(input: &DscrAnalyticsInput) -> PricingResult<ComputationOutput<DscrMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;
    let loan = &input.option;

    // --- Debt service ---
    let payment = monthly_payment(loan.loan_amount, loan.final_rate, loan.term_years, loan.interest_only)?;
    if let Some(quoted) = loan.monthly_payment {
        if (quoted - payment).abs() > PAYMENT_TOLERANCE {
            warnings.push(format!(
                "Quoted monthly payment {quoted} differs from recomputed {}; using recomputed value",
                payment.round_dp(2)
            ));
        }
    }
    let debt_service = annual_debt_service(payment)?;

    // --- NOI ---
    let annual_rental_income = input.monthly_rental_income * dec!(12);
    let annual_operating_expenses = input.annual_property_insurance
        + input.annual_property_taxes
        + input.monthly_hoa_fee * dec!(12);
    let noi = annual_rental_income - annual_operating_expenses;
    let cash_flow = noi - debt_service;
    let total_cash_invested = input.down_payment + input.closing_costs;

    // --- Ratios ---
    let dscr = Ratio::checked(noi, debt_service, "noi / debt_service");
    let cap_rate = Ratio::checked(noi, input.estimated_home_value, "noi / estimated_home_value")
        .scaled(dec!(100));
    let cash_on_cash_return = Ratio::checked(
        cash_flow,
        total_cash_invested,
        "cash_flow / (down_payment + closing_costs)",
    )
    .scaled(dec!(100));
    let break_even_ratio = Ratio::checked(
        annual_operating_expenses + debt_service,
        annual_rental_income,
        "(operating expenses + debt_service) / annual_rental_income",
    );

    // --- Warnings ---
    if let Some(value) = dscr.value() {
        if value < Decimal::ONE {
            warnings.push(format!(
                "DSCR of {:.2} is below 1.00x; rent does not cover debt service",
                value
            ));
        }
    }
    if cash_flow < Decimal::ZERO {
        warnings.push(format!("Negative annual cash flow of {}", cash_flow.round_dp(2)));
    }

    tracing::debug!(%noi, %debt_service, dscr = ?dscr.value(), "dscr analytics computed");

    let metrics = DscrMetrics {
        annual_rental_income,
        annual_operating_expenses,
        noi,
        monthly_payment: payment,
        debt_service,
        dscr,
        cap_rate,
        cash_flow,
        total_cash_invested,
        cash_on_cash_return,
        break_even_ratio,
    };

    let assumptions = serde_json::json!({
        "debt_service": "recomputed monthly payment × 12",
        "operating_expenses": "insurance + taxes + monthly HOA × 12",
        "vacancy": "none",
        "total_cash_invested": "down_payment + closing_costs",
    });
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "DSCR cash-flow analytics",
        &assumptions,
        warnings,
        elapsed,
        metrics,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &DscrAnalyticsInput) -> PricingResult<()> {
    if input.option.loan_amount <= Decimal::ZERO {
        return Err(PricingError::invalid("option.loan_amount", "Loan amount must be positive"));
    }
    if input.option.final_rate < Decimal::ZERO || input.option.final_rate > MAX_NOTE_RATE {
        return Err(PricingError::invalid(
            "option.final_rate",
            format!("Rate must be between 0 and {MAX_NOTE_RATE}"),
        ));
    }
    if !input.option.interest_only && input.option.term_years == 0 {
        return Err(PricingError::invalid("option.term_years", "Amortizing loans need a term"));
    }
    if input.option.term_years > MAX_TERM_YEARS {
        return Err(PricingError::invalid(
            "option.term_years",
            format!("Term cannot exceed {MAX_TERM_YEARS} years"),
        ));
    }
    for (field, value) in [
        ("option.loan_amount", input.option.loan_amount),
        ("monthly_rental_income", input.monthly_rental_income),
        ("annual_property_insurance", input.annual_property_insurance),
        ("annual_property_taxes", input.annual_property_taxes),
        ("monthly_hoa_fee", input.monthly_hoa_fee),
        ("estimated_home_value", input.estimated_home_value),
        ("down_payment", input.down_payment),
        ("closing_costs", input.closing_costs),
    ] {
        if value < Decimal::ZERO {
            return Err(PricingError::invalid(field, "Must be non-negative"));
        }
        if value > MAX_AMOUNT {
            return Err(PricingError::invalid(field, format!("Cannot exceed {MAX_AMOUNT}")));
        }
    }
    Ok(())
}
