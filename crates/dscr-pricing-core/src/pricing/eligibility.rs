use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::input::PricingInput;
use crate::loan::Product;
use crate::rate_table::sheet::{ProductTerms, RateSheet};
use crate::types::Percent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionCode {
    ProgramNotOffered,
    PropertyTypeNotMapped,
    OccupancyNotEligible,
    StateNotEligible,
    FicoBelowMinimum,
    LtvAboveMaximum,
    LoanAmountOutOfRange,
    DscrBelowMinimum,
    SubOneDscrLtv,
    InterestOnlyFicoBelowMinimum,
    RateNotOffered,
    ProductNotOffered,
    InterestOnlyNotAvailable,
}

/// Why a product (or, with `product: None`, the whole request) was not priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityExclusion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    pub code: ExclusionCode,
    pub reason: String,
}

impl EligibilityExclusion {
    pub fn program(code: ExclusionCode, reason: impl Into<String>) -> Self {
        EligibilityExclusion {
            product: None,
            code,
            reason: reason.into(),
        }
    }

    pub fn product(product: Product, code: ExclusionCode, reason: impl Into<String>) -> Self {
        EligibilityExclusion {
            product: Some(product),
            code,
            reason: reason.into(),
        }
    }
}

/// Program-wide rules. The first failing rule excludes every product.
pub fn program_exclusion(
    sheet: &RateSheet,
    input: &PricingInput,
    ltv: Percent,
) -> Option<EligibilityExclusion> {
    let rules = &sheet.eligibility;
    let exclude = EligibilityExclusion::program;

    if !sheet.ltv_adjustments.contains_key(&input.property_type) {
        return Some(exclude(
            ExclusionCode::PropertyTypeNotMapped,
            format!("Property type {} is not priced by {}", input.property_type, sheet.program_id),
        ));
    }

    if !rules.eligible_occupancies.contains(&input.occupancy_type) {
        return Some(exclude(
            ExclusionCode::OccupancyNotEligible,
            format!("Occupancy {} is not eligible for DSCR financing", input.occupancy_type),
        ));
    }

    if rules.excluded_states.iter().any(|s| s == &input.property_state) {
        return Some(exclude(
            ExclusionCode::StateNotEligible,
            format!("Properties in {} are not eligible", input.property_state),
        ));
    }

    if input.fico < rules.min_fico {
        return Some(exclude(
            ExclusionCode::FicoBelowMinimum,
            format!("FICO {} is below the program minimum {}", input.fico, rules.min_fico),
        ));
    }

    let max_ltv = rules
        .max_ltv
        .get(&input.loan_purpose)
        .copied()
        .unwrap_or(Decimal::ZERO);
    if ltv > max_ltv {
        return Some(exclude(
            ExclusionCode::LtvAboveMaximum,
            format!("LTV {ltv} exceeds the {} maximum of {max_ltv}", input.loan_purpose),
        ));
    }

    if input.loan_amount < rules.min_loan_amount || input.loan_amount > rules.max_loan_amount {
        return Some(exclude(
            ExclusionCode::LoanAmountOutOfRange,
            format!(
                "Loan amount {} is outside {}–{}",
                input.loan_amount, rules.min_loan_amount, rules.max_loan_amount
            ),
        ));
    }

    if input.dscr < rules.min_dscr {
        return Some(exclude(
            ExclusionCode::DscrBelowMinimum,
            format!("DSCR {} is below the program minimum {}", input.dscr, rules.min_dscr),
        ));
    }

    if input.dscr < Decimal::ONE && ltv > rules.sub_one_dscr_max_ltv {
        return Some(exclude(
            ExclusionCode::SubOneDscrLtv,
            format!(
                "DSCR {} below 1.00 requires LTV <= {} (LTV {ltv})",
                input.dscr, rules.sub_one_dscr_max_ltv
            ),
        ));
    }

    if input.interest_only && input.fico < rules.interest_only_min_fico {
        return Some(exclude(
            ExclusionCode::InterestOnlyFicoBelowMinimum,
            format!(
                "Interest-only requires FICO >= {} (FICO {})",
                rules.interest_only_min_fico, input.fico
            ),
        ));
    }

    None
}

/// Product-level rules, applied after the program rules pass.
pub fn product_exclusion(terms: &ProductTerms, input: &PricingInput) -> Option<EligibilityExclusion> {
    if input.interest_only && !terms.interest_only_allowed {
        return Some(EligibilityExclusion::product(
            terms.product,
            ExclusionCode::InterestOnlyNotAvailable,
            format!("{} is not offered interest-only", terms.product),
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{LoanPurpose, OccupancyType, PropertyType};
    use crate::rate_table::standard::standard_dscr_sheet;
    use rust_decimal_macros::dec;

    fn input() -> PricingInput {
        PricingInput {
            fico: 745,
            ltv: None,
            loan_amount: dec!(160000),
            loan_purpose: LoanPurpose::Purchase,
            property_type: PropertyType::SingleFamily,
            property_state: "TX".into(),
            occupancy_type: OccupancyType::Investment,
            product: None,
            interest_only: false,
            prepay_structure: "5/4/3/2/1".into(),
            dscr: dec!(1.10),
            broker_comp: dec!(1),
            ysp: dec!(1),
            discount_points: dec!(0),
            broker_admin_fee: dec!(0),
            estimated_home_value: Some(dec!(200000)),
            monthly_rental_income: dec!(0),
            annual_property_insurance: dec!(0),
            annual_property_taxes: dec!(0),
            monthly_hoa_fee: dec!(0),
            is_short_term_rental: false,
            units: 1,
        }
    }

    fn code(sheet: &RateSheet, input: &PricingInput, ltv: Percent) -> Option<ExclusionCode> {
        program_exclusion(sheet, input, ltv).map(|e| e.code)
    }

    #[test]
    fn test_eligible_reference_loan() {
        let sheet = standard_dscr_sheet();
        assert_eq!(code(&sheet, &input(), dec!(80)), None);
    }

    #[test]
    fn test_multi_family_excluded_not_error() {
        let sheet = standard_dscr_sheet();
        let mut i = input();
        i.property_type = PropertyType::MultiFamily;
        i.units = 8;
        assert_eq!(code(&sheet, &i, dec!(70)), Some(ExclusionCode::PropertyTypeNotMapped));
    }

    #[test]
    fn test_owner_occupied_excluded() {
        let sheet = standard_dscr_sheet();
        let mut i = input();
        i.occupancy_type = OccupancyType::OwnerOccupied;
        assert_eq!(code(&sheet, &i, dec!(80)), Some(ExclusionCode::OccupancyNotEligible));
    }

    #[test]
    fn test_cash_out_ltv_cap() {
        let sheet = standard_dscr_sheet();
        let mut i = input();
        i.loan_purpose = LoanPurpose::CashOut;
        assert_eq!(code(&sheet, &i, dec!(75)), None);
        assert_eq!(code(&sheet, &i, dec!(75.5)), Some(ExclusionCode::LtvAboveMaximum));
    }

    #[test]
    fn test_loan_limits_inclusive() {
        let sheet = standard_dscr_sheet();
        let mut i = input();
        i.loan_amount = dec!(75000);
        assert_eq!(code(&sheet, &i, dec!(60)), None);
        i.loan_amount = dec!(74999);
        assert_eq!(code(&sheet, &i, dec!(60)), Some(ExclusionCode::LoanAmountOutOfRange));
    }

    #[test]
    fn test_sub_one_dscr_requires_low_ltv() {
        let sheet = standard_dscr_sheet();
        let mut i = input();
        i.dscr = dec!(0.80);
        assert_eq!(code(&sheet, &i, dec!(65)), None);
        assert_eq!(code(&sheet, &i, dec!(70)), Some(ExclusionCode::SubOneDscrLtv));
        i.dscr = dec!(0.70);
        assert_eq!(code(&sheet, &i, dec!(50)), Some(ExclusionCode::DscrBelowMinimum));
    }

    #[test]
    fn test_excluded_state() {
        let mut sheet = standard_dscr_sheet();
        sheet.eligibility.excluded_states.push("TX".into());
        assert_eq!(code(&sheet, &input(), dec!(80)), Some(ExclusionCode::StateNotEligible));
    }

    #[test]
    fn test_interest_only_rules() {
        let sheet = standard_dscr_sheet();
        let mut i = input();
        i.interest_only = true;
        i.fico = 690;
        assert_eq!(
            code(&sheet, &i, dec!(70)),
            Some(ExclusionCode::InterestOnlyFicoBelowMinimum)
        );

        let arm = sheet.product_terms(Product::FiveSixArm).unwrap();
        let ex = product_exclusion(arm, &i).unwrap();
        assert_eq!(ex.code, ExclusionCode::InterestOnlyNotAvailable);
        assert_eq!(ex.product, Some(Product::FiveSixArm));
    }
}
