use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::loan::{LoanPurpose, OccupancyType, Product, PropertyType};
use crate::rate_table::sheet::is_state_code;
use crate::types::{Money, Multiple, Percent, MAX_AMOUNT};
use crate::PricingResult;

/// Tolerance before a caller-supplied LTV is reported as disagreeing with the
/// value derived from loan amount and property value.
const LTV_TOLERANCE: Decimal = dec!(0.01);

fn default_occupancy() -> OccupancyType {
    OccupancyType::Investment
}

fn default_units() -> u32 {
    1
}

/// Normalized borrower/property inputs for one pricing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingInput {
    /// Representative credit score
    pub fico: u16,
    /// Loan-to-value in percent. Ignored in favour of the derived value when
    /// `estimated_home_value` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltv: Option<Percent>,
    pub loan_amount: Money,
    pub loan_purpose: LoanPurpose,
    pub property_type: PropertyType,
    /// Two-letter state code
    pub property_state: String,
    #[serde(default = "default_occupancy")]
    pub occupancy_type: OccupancyType,
    /// Price only this product; every offered product when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    #[serde(default)]
    pub interest_only: bool,
    /// Prepayment penalty structure key, e.g. "5/4/3/2/1" or "None"
    pub prepay_structure: String,
    pub dscr: Multiple,
    /// Broker compensation in points
    #[serde(default)]
    pub broker_comp: Percent,
    /// Yield spread premium in points
    #[serde(default)]
    pub ysp: Percent,
    /// Discount points bought, 0–3 in quarter points
    #[serde(default)]
    pub discount_points: Decimal,
    #[serde(default)]
    pub broker_admin_fee: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_home_value: Option<Money>,
    #[serde(default)]
    pub monthly_rental_income: Money,
    #[serde(default)]
    pub annual_property_insurance: Money,
    #[serde(default)]
    pub annual_property_taxes: Money,
    #[serde(default)]
    pub monthly_hoa_fee: Money,
    #[serde(default)]
    pub is_short_term_rental: bool,
    #[serde(default = "default_units")]
    pub units: u32,
}

/// Inbound pricing call: program identifier plus inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    /// Program id; the rate book's default program when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    pub input: PricingInput,
}

impl PricingInput {
    /// Reject the whole request on any missing or malformed field.
    pub fn validate(&self) -> PricingResult<()> {
        if !(300..=850).contains(&self.fico) {
            return Err(PricingError::invalid(
                "fico",
                format!("Credit score {} is outside 300–850", self.fico),
            ));
        }

        if self.loan_amount <= Decimal::ZERO {
            return Err(PricingError::invalid("loan_amount", "Loan amount must be positive"));
        }

        match (self.estimated_home_value, self.ltv) {
            (Some(value), _) if value <= Decimal::ZERO => {
                return Err(PricingError::invalid(
                    "estimated_home_value",
                    "Estimated home value must be positive",
                ));
            }
            (None, None) => {
                return Err(PricingError::invalid(
                    "ltv",
                    "Either ltv or estimated_home_value is required",
                ));
            }
            (None, Some(ltv)) if ltv <= Decimal::ZERO => {
                return Err(PricingError::invalid("ltv", "LTV must be positive"));
            }
            _ => {}
        }

        if !is_state_code(&self.property_state) {
            return Err(PricingError::invalid(
                "property_state",
                format!("'{}' is not a two-letter state code", self.property_state),
            ));
        }

        if self.prepay_structure.trim().is_empty() {
            return Err(PricingError::invalid(
                "prepay_structure",
                "Prepayment structure is required (use \"None\" for no penalty)",
            ));
        }

        if self.dscr <= Decimal::ZERO {
            return Err(PricingError::invalid("dscr", "DSCR must be positive"));
        }

        for (field, value) in [
            ("loan_amount", self.loan_amount),
            ("estimated_home_value", self.estimated_home_value.unwrap_or(Decimal::ZERO)),
            ("broker_admin_fee", self.broker_admin_fee),
            ("monthly_rental_income", self.monthly_rental_income),
            ("annual_property_insurance", self.annual_property_insurance),
            ("annual_property_taxes", self.annual_property_taxes),
            ("monthly_hoa_fee", self.monthly_hoa_fee),
        ] {
            if value > MAX_AMOUNT {
                return Err(PricingError::invalid(field, format!("Cannot exceed {MAX_AMOUNT}")));
            }
        }

        for (field, value) in [
            ("broker_comp", self.broker_comp),
            ("ysp", self.ysp),
            ("broker_admin_fee", self.broker_admin_fee),
            ("monthly_rental_income", self.monthly_rental_income),
            ("annual_property_insurance", self.annual_property_insurance),
            ("annual_property_taxes", self.annual_property_taxes),
            ("monthly_hoa_fee", self.monthly_hoa_fee),
        ] {
            if value < Decimal::ZERO {
                return Err(PricingError::invalid(field, "Must be non-negative"));
            }
        }

        if self.discount_points < Decimal::ZERO || self.discount_points > dec!(3) {
            return Err(PricingError::invalid(
                "discount_points",
                "Discount points must be between 0 and 3",
            ));
        }
        if !(self.discount_points / dec!(0.25)).fract().is_zero() {
            return Err(PricingError::invalid(
                "discount_points",
                "Discount points are bought in quarter-point increments",
            ));
        }

        let (min_units, max_units) = self.property_type.unit_range();
        if self.units < min_units || self.units > max_units {
            return Err(PricingError::invalid(
                "units",
                format!(
                    "{} units is inconsistent with property type {}",
                    self.units, self.property_type
                ),
            ));
        }

        Ok(())
    }

    /// LTV used for pricing: derived from loan amount and property value when
    /// available, otherwise the caller's value.
    pub fn effective_ltv(&self, warnings: &mut Vec<String>) -> PricingResult<Percent> {
        match self.estimated_home_value {
            Some(value) => {
                if value.is_zero() {
                    return Err(PricingError::DivisionByZero {
                        context: "LTV (loan_amount / estimated_home_value)".into(),
                    });
                }
                let derived = derive_ltv(self.loan_amount, value)?;
                if let Some(stated) = self.ltv {
                    if (stated - derived).abs() > LTV_TOLERANCE {
                        warnings.push(format!(
                            "Stated LTV {stated} differs from derived LTV {derived}; using derived value"
                        ));
                    }
                }
                Ok(derived)
            }
            None => self
                .ltv
                .ok_or_else(|| PricingError::invalid("ltv", "LTV could not be determined")),
        }
    }
}

/// `loan_amount / value × 100`. A value tiny enough to push the quotient out
/// of range is an overflow, not a panic.
pub(crate) fn derive_ltv(loan_amount: Money, value: Money) -> PricingResult<Percent> {
    loan_amount
        .checked_div(value)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .ok_or_else(|| PricingError::overflow("LTV (loan_amount / estimated_home_value)"))
}
