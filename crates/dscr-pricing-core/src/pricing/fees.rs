use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::input::PricingInput;
use crate::rate_table::sheet::{LoanSizeBand, PrepayTerms, RateSheet};
use crate::types::Money;

/// Closing fees attached to a loan option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Broker compensation: loan × broker_comp%
    pub origination_fee: Money,
    pub underwriting_fee: Money,
    /// Lender-paid compensation disclosed as a fee: loan × ysp%
    pub ysp_fee: Money,
    /// Prepay structure buy-out: loan × fee_points%
    pub prepay_fee: Money,
    pub loan_size_adjustment_fee: Money,
    /// Present only when the loan is below the small-loan threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_loan_fee: Option<Money>,
    pub admin_fee: Money,
    /// Cost of discount points: loan × discount_points%
    pub discount_points_fee: Money,
}

impl FeeBreakdown {
    pub fn total(&self) -> Money {
        self.origination_fee
            + self.underwriting_fee
            + self.ysp_fee
            + self.prepay_fee
            + self.loan_size_adjustment_fee
            + self.small_loan_fee.unwrap_or(Decimal::ZERO)
            + self.admin_fee
            + self.discount_points_fee
    }
}

fn points_of(loan_amount: Money, points: Decimal) -> Money {
    loan_amount * points / dec!(100)
}

pub fn compute_fees(
    sheet: &RateSheet,
    input: &PricingInput,
    size_band: &LoanSizeBand,
    prepay: &PrepayTerms,
) -> FeeBreakdown {
    let loan = input.loan_amount;
    let small_loan_fee = if loan < sheet.fees.small_loan_threshold {
        Some(sheet.fees.small_loan_fee)
    } else {
        None
    };

    FeeBreakdown {
        origination_fee: points_of(loan, input.broker_comp),
        underwriting_fee: sheet.fees.underwriting_fee,
        ysp_fee: points_of(loan, input.ysp),
        prepay_fee: points_of(loan, prepay.fee_points),
        loan_size_adjustment_fee: size_band.fee,
        small_loan_fee,
        admin_fee: input.broker_admin_fee,
        discount_points_fee: points_of(loan, input.discount_points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustments::{loan_size_band, prepay_terms};
    use crate::loan::{LoanPurpose, OccupancyType, PropertyType};
    use crate::rate_table::standard::standard_dscr_sheet;

    fn input(loan_amount: Money) -> PricingInput {
        PricingInput {
            fico: 745,
            ltv: None,
            loan_amount,
            loan_purpose: LoanPurpose::Purchase,
            property_type: PropertyType::SingleFamily,
            property_state: "TX".into(),
            occupancy_type: OccupancyType::Investment,
            product: None,
            interest_only: false,
            prepay_structure: "5/4/3/2/1".into(),
            dscr: dec!(1.3),
            broker_comp: dec!(1),
            ysp: dec!(1),
            discount_points: dec!(0.5),
            broker_admin_fee: dec!(995),
            estimated_home_value: Some(dec!(200000)),
            monthly_rental_income: dec!(0),
            annual_property_insurance: dec!(0),
            annual_property_taxes: dec!(0),
            monthly_hoa_fee: dec!(0),
            is_short_term_rental: false,
            units: 1,
        }
    }

    #[test]
    fn test_reference_fees() {
        let sheet = standard_dscr_sheet();
        let i = input(dec!(160000));
        let band = loan_size_band(&sheet, i.loan_amount).unwrap();
        let prepay = prepay_terms(&sheet, &i.prepay_structure).unwrap();
        let fees = compute_fees(&sheet, &i, band, prepay);

        assert_eq!(fees.origination_fee, dec!(1600));
        assert_eq!(fees.underwriting_fee, dec!(1495));
        assert_eq!(fees.ysp_fee, dec!(1600));
        assert_eq!(fees.prepay_fee, dec!(0));
        assert_eq!(fees.loan_size_adjustment_fee, dec!(0));
        assert_eq!(fees.small_loan_fee, None);
        assert_eq!(fees.admin_fee, dec!(995));
        assert_eq!(fees.discount_points_fee, dec!(800));
        assert_eq!(fees.total(), dec!(6490));
    }

    #[test]
    fn test_small_loan_fee_below_threshold_only() {
        let sheet = standard_dscr_sheet();
        let prepay = prepay_terms(&sheet, "None").unwrap();

        let small = input(dec!(90000));
        let band = loan_size_band(&sheet, small.loan_amount).unwrap();
        assert_eq!(compute_fees(&sheet, &small, band, prepay).small_loan_fee, Some(dec!(1000)));

        let at = input(dec!(100000));
        let band = loan_size_band(&sheet, at.loan_amount).unwrap();
        assert_eq!(compute_fees(&sheet, &at, band, prepay).small_loan_fee, None);
    }

    #[test]
    fn test_prepay_fee_points() {
        let mut sheet = standard_dscr_sheet();
        if let Some(terms) = sheet.prepay_structures.get_mut("0/0/0") {
            terms.fee_points = dec!(0.5);
        }
        let i = input(dec!(400000));
        let band = loan_size_band(&sheet, i.loan_amount).unwrap();
        let prepay = prepay_terms(&sheet, "0/0/0").unwrap();
        assert_eq!(compute_fees(&sheet, &i, band, prepay).prepay_fee, dec!(2000));
    }

    #[test]
    fn test_jumbo_size_fee() {
        let sheet = standard_dscr_sheet();
        let i = input(dec!(2500000));
        let band = loan_size_band(&sheet, i.loan_amount).unwrap();
        let prepay = prepay_terms(&sheet, "None").unwrap();
        assert_eq!(compute_fees(&sheet, &i, band, prepay).loan_size_adjustment_fee, dec!(750));
    }
}
