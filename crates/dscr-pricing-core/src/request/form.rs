use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PricingError;
use crate::loan::{LoanPurpose, OccupancyType, Product, PropertyType};
use crate::pricing::input::derive_ltv;
use crate::pricing::{PricingInput, PricingRequest};
use crate::types::Money;
use crate::PricingResult;

/// Highest score a FICO bucket resolves to.
const FICO_CEILING: u16 = 850;
/// Offset from a bucket's lower bound to its representative score.
const FICO_BUCKET_OFFSET: u16 = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan application as the portal submits it: camelCase keys, display
/// strings for currency, percentages and enumerations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplicationForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// "780+", "740-759" or a plain score
    pub fico_score: String,
    pub loan_amount: String,
    pub estimated_home_value: String,
    pub loan_purpose: String,
    pub property_type: String,
    pub property_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default)]
    pub interest_only: bool,
    pub prepay_structure: String,
    pub dscr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker_comp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ysp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_points: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker_admin_fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rental_income: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_property_insurance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_property_taxes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_hoa_fee: Option<String>,
    #[serde(default)]
    pub is_short_term_rental: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<u32>,
    /// Cash-flow analytics inputs, used by the quote flow only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_costs: Option<String>,
}

impl LoanApplicationForm {
    /// Translate the form into an engine request. LTV is always derived from
    /// loan amount and estimated value.
    pub fn normalize(&self) -> PricingResult<PricingRequest> {
        let loan_amount = parse_amount("loanAmount", &self.loan_amount)?;
        let estimated_home_value = parse_amount("estimatedHomeValue", &self.estimated_home_value)?;
        if estimated_home_value <= Decimal::ZERO {
            return Err(PricingError::invalid(
                "estimatedHomeValue",
                "Estimated home value must be positive",
            ));
        }
        let ltv = derive_ltv(loan_amount, estimated_home_value)?;

        let property_type = parse_property_type(&self.property_type)?;
        let units = self.units.unwrap_or(property_type.unit_range().0);

        let occupancy_type = match &self.occupancy_type {
            Some(label) => parse_occupancy(label)?,
            None => OccupancyType::Investment,
        };
        let product = self.product.as_deref().map(parse_product).transpose()?;

        let input = PricingInput {
            fico: parse_fico(&self.fico_score)?,
            ltv: Some(ltv),
            loan_amount,
            loan_purpose: parse_loan_purpose(&self.loan_purpose)?,
            property_type,
            property_state: self.property_state.trim().to_ascii_uppercase(),
            occupancy_type,
            product,
            interest_only: self.interest_only,
            prepay_structure: prepay_key(&self.prepay_structure),
            dscr: parse_amount("dscr", &self.dscr)?,
            broker_comp: optional_amount("brokerComp", &self.broker_comp)?,
            ysp: optional_amount("ysp", &self.ysp)?,
            discount_points: optional_amount("discountPoints", &self.discount_points)?,
            broker_admin_fee: optional_amount("brokerAdminFee", &self.broker_admin_fee)?,
            estimated_home_value: Some(estimated_home_value),
            monthly_rental_income: optional_amount("monthlyRentalIncome", &self.monthly_rental_income)?,
            annual_property_insurance: optional_amount(
                "annualPropertyInsurance",
                &self.annual_property_insurance,
            )?,
            annual_property_taxes: optional_amount("annualPropertyTaxes", &self.annual_property_taxes)?,
            monthly_hoa_fee: optional_amount("monthlyHoaFee", &self.monthly_hoa_fee)?,
            is_short_term_rental: self.is_short_term_rental,
            units,
        };

        Ok(PricingRequest {
            program: self
                .program
                .as_ref()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            input,
        })
    }

    /// Down payment and closing costs, when the form carries both.
    pub fn cash_invested(&self) -> PricingResult<Option<(Money, Money)>> {
        match (&self.down_payment, &self.closing_costs) {
            (Some(down), Some(closing)) => Ok(Some((
                parse_amount("downPayment", down)?,
                parse_amount("closingCosts", closing)?,
            ))),
            _ => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Representative score for a FICO bucket: lower bound + 5, capped at the
/// bucket's upper bound (or 850 for an open bucket).
pub fn parse_fico(raw: &str) -> PricingResult<u16> {
    let s = raw.trim();
    let bad = || PricingError::invalid("ficoScore", format!("Unrecognised FICO bucket '{raw}'"));
    let score = |t: &str| t.trim().parse::<u16>().map_err(|_| bad());

    if let Some(lower) = s.strip_suffix('+') {
        let lower = score(lower)?;
        return Ok(lower.saturating_add(FICO_BUCKET_OFFSET).min(FICO_CEILING));
    }

    if let Some((lo, hi)) = s.split_once(['-', '–']) {
        let (lo, hi) = (score(lo)?, score(hi)?);
        if lo > hi {
            return Err(bad());
        }
        return Ok(lo.saturating_add(FICO_BUCKET_OFFSET).min(hi));
    }

    score(s)
}

/// Currency or percentage display string to a decimal: "$160,000" → 160000,
/// "1%" → 1.
pub fn parse_amount(field: &str, raw: &str) -> PricingResult<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(PricingError::invalid(field, "Value is required"));
    }
    Decimal::from_str(&cleaned)
        .map_err(|_| PricingError::invalid(field, format!("'{raw}' is not a number")))
}

fn optional_amount(field: &str, raw: &Option<String>) -> PricingResult<Decimal> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Decimal::ZERO),
        Some(s) => parse_amount(field, s),
    }
}

/// Lowercase, with `_` and `-` read as spaces and runs of whitespace collapsed.
fn label_key(label: &str) -> String {
    label
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_loan_purpose(label: &str) -> PricingResult<LoanPurpose> {
    match label_key(label).as_str() {
        "purchase" => Ok(LoanPurpose::Purchase),
        "refinance" | "refi" | "rate term refinance" | "rate/term refinance" | "no cash out refinance" => {
            Ok(LoanPurpose::Refinance)
        }
        "cash out" | "cash out refinance" | "cash out refi" => Ok(LoanPurpose::CashOut),
        _ => Err(PricingError::invalid(
            "loanPurpose",
            format!("Unknown loan purpose '{label}'"),
        )),
    }
}

pub fn parse_property_type(label: &str) -> PricingResult<PropertyType> {
    match label_key(label).as_str() {
        "single family" | "single family residence" | "sfr" => Ok(PropertyType::SingleFamily),
        "townhome" | "townhouse" => Ok(PropertyType::Townhome),
        "condo" | "condominium" | "warrantable condo" => Ok(PropertyType::Condo),
        "2 4 unit" | "2 4 units" | "two to four unit" | "two to four units" => {
            Ok(PropertyType::TwoToFourUnit)
        }
        "multi family" | "multifamily" | "5+ units" => Ok(PropertyType::MultiFamily),
        "mixed use" => Ok(PropertyType::MixedUse),
        _ => Err(PricingError::invalid(
            "propertyType",
            format!("Unknown property type '{label}'"),
        )),
    }
}

pub fn parse_occupancy(label: &str) -> PricingResult<OccupancyType> {
    match label_key(label).as_str() {
        "investment" | "investment property" | "investor" | "non owner occupied" => {
            Ok(OccupancyType::Investment)
        }
        "owner occupied" | "primary" | "primary residence" => Ok(OccupancyType::OwnerOccupied),
        "second home" => Ok(OccupancyType::SecondHome),
        _ => Err(PricingError::invalid(
            "occupancyType",
            format!("Unknown occupancy '{label}'"),
        )),
    }
}

pub fn parse_product(label: &str) -> PricingResult<Product> {
    match label_key(label).as_str() {
        "30 year fixed" | "30yr fixed" | "30 yr fixed" => Ok(Product::ThirtyYearFixed),
        "40 year fixed" | "40yr fixed" | "40 yr fixed" => Ok(Product::FortyYearFixed),
        "7/6 arm" => Ok(Product::SevenSixArm),
        "5/6 arm" => Ok(Product::FiveSixArm),
        _ => Err(PricingError::invalid(
            "product",
            format!("Unknown product '{label}'"),
        )),
    }
}

/// Rate-sheet key for a prepay label. "No prepay" style labels map to
/// "None"; any other label passes through trimmed and is checked by the
/// engine against the sheet.
pub fn prepay_key(label: &str) -> String {
    match label_key(label).as_str() {
        "none" | "no prepay" | "no prepayment penalty" | "no ppp" => "None".to_string(),
        _ => label.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_form() -> LoanApplicationForm {
        LoanApplicationForm {
            fico_score: "740-759".into(),
            loan_amount: "$160,000".into(),
            estimated_home_value: "$200,000".into(),
            loan_purpose: "Purchase".into(),
            property_type: "Single Family".into(),
            property_state: "tx".into(),
            product: Some("30 Year Fixed".into()),
            prepay_structure: "5/4/3/2/1".into(),
            dscr: "1.10".into(),
            broker_comp: Some("1%".into()),
            ysp: Some("1%".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_fico_buckets() {
        assert_eq!(parse_fico("780+").unwrap(), 785);
        assert_eq!(parse_fico("740-759").unwrap(), 745);
        assert_eq!(parse_fico("740–759").unwrap(), 745);
        assert_eq!(parse_fico("660-662").unwrap(), 662);
        assert_eq!(parse_fico("848+").unwrap(), 850);
        assert_eq!(parse_fico(" 712 ").unwrap(), 712);
        assert!(parse_fico("excellent").is_err());
        assert!(parse_fico("760-740").is_err());
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(parse_amount("x", "$1,250,000.50").unwrap(), dec!(1250000.50));
        assert_eq!(parse_amount("x", "0.5 %").unwrap(), dec!(0.5));
        assert_eq!(parse_amount("loanAmount", "").unwrap_err().field(), Some("loanAmount"));
        assert!(parse_amount("x", "12k").is_err());
    }

    #[test]
    fn test_label_mapping() {
        assert_eq!(parse_loan_purpose("Cash-Out Refinance").unwrap(), LoanPurpose::CashOut);
        assert_eq!(parse_loan_purpose("rate_term_refinance").unwrap(), LoanPurpose::Refinance);
        assert_eq!(parse_property_type("2-4 Unit").unwrap(), PropertyType::TwoToFourUnit);
        assert_eq!(parse_property_type("Multi Family").unwrap(), PropertyType::MultiFamily);
        assert_eq!(parse_product("7/6 ARM").unwrap(), Product::SevenSixArm);
        assert_eq!(parse_product("30_Year_Fixed").unwrap(), Product::ThirtyYearFixed);
        assert_eq!(parse_occupancy("Non-Owner Occupied").unwrap(), OccupancyType::Investment);
        assert!(parse_property_type("Houseboat").is_err());
        assert_eq!(prepay_key("No Prepay"), "None");
        assert_eq!(prepay_key(" 3/2/1 "), "3/2/1");
    }

    #[test]
    fn test_normalize_sample() {
        let req = sample_form().normalize().unwrap();
        let input = &req.input;
        assert_eq!(input.fico, 745);
        assert_eq!(input.ltv, Some(dec!(80)));
        assert_eq!(input.loan_amount, dec!(160000));
        assert_eq!(input.property_state, "TX");
        assert_eq!(input.product, Some(Product::ThirtyYearFixed));
        assert_eq!(input.broker_comp, dec!(1));
        assert_eq!(input.discount_points, Decimal::ZERO);
        assert_eq!(input.occupancy_type, OccupancyType::Investment);
        assert_eq!(input.units, 1);
        assert!(req.program.is_none());
        input.validate().unwrap();
    }

    #[test]
    fn test_units_default_from_property_type() {
        let mut form = sample_form();
        form.property_type = "Multi Family".into();
        assert_eq!(form.normalize().unwrap().input.units, 5);
    }

    #[test]
    fn test_zero_value_rejected() {
        let mut form = sample_form();
        form.estimated_home_value = "$0".into();
        let err = form.normalize().unwrap_err();
        assert_eq!(err.field(), Some("estimatedHomeValue"));
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = r#"{
            "ficoScore": "780+",
            "loanAmount": "$300,000",
            "estimatedHomeValue": "$400,000",
            "loanPurpose": "Refinance",
            "propertyType": "Condo",
            "propertyState": "FL",
            "prepayStructure": "None",
            "dscr": "1.3",
            "isShortTermRental": true
        }"#;
        let form: LoanApplicationForm = serde_json::from_str(json).unwrap();
        let req = form.normalize().unwrap();
        assert_eq!(req.input.fico, 785);
        assert_eq!(req.input.ltv, Some(dec!(75)));
        assert!(req.input.is_short_term_rental);
        assert_eq!(form.cash_invested().unwrap(), None);
    }
}
