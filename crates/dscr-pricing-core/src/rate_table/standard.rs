//! Built-in rate sheet for the standard DSCR investor program.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::bands::Band;
use super::sheet::{
    DscrBand, EligibilityRules, FeeSchedule, FicoTier, LoanSizeBand, PointAdjustment,
    PrepayTerms, ProductTerms, ProgramAdjustments, RateSheet,
};
use crate::loan::{LoanPurpose, OccupancyType, Product, PropertyType};

pub const STANDARD_PROGRAM_ID: &str = "dscr-standard";

/// The standard DSCR rate sheet.
///
/// The `[1.00, 1.20]` DSCR band carries +0.175, the value implied by the
/// 7.400 target on the reference scenario. It is flagged provisional until
/// product owners sign off, so every quote landing in it carries a warning.
pub fn standard_dscr_sheet() -> RateSheet {
    RateSheet {
        program_id: STANDARD_PROGRAM_ID.into(),
        lender_id: "dscr-wholesale".into(),
        lender_name: "DSCR Wholesale Lending".into(),
        version: "2024.06".into(),
        effective_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or(NaiveDate::MIN),
        eligibility: EligibilityRules {
            min_fico: 660,
            max_ltv: BTreeMap::from([
                (LoanPurpose::Purchase, dec!(80)),
                (LoanPurpose::Refinance, dec!(80)),
                (LoanPurpose::CashOut, dec!(75)),
            ]),
            min_loan_amount: dec!(75000),
            max_loan_amount: dec!(3000000),
            min_dscr: dec!(0.75),
            sub_one_dscr_max_ltv: dec!(65),
            eligible_occupancies: vec![OccupancyType::Investment],
            excluded_states: Vec::new(),
            interest_only_min_fico: 700,
        },
        fico_tiers: fico_tiers(),
        ltv_bands: vec![
            Band::upper_closed(dec!(0), dec!(55)),
            Band::upper_closed(dec!(55), dec!(60)),
            Band::upper_closed(dec!(60), dec!(65)),
            Band::upper_closed(dec!(65), dec!(70)),
            Band::upper_closed(dec!(70), dec!(75)),
            Band::upper_closed(dec!(75), dec!(80)),
        ],
        //                  <=55          55-60         60-65         65-70         70-75         75-80
        base_rates: vec![
            vec![Some(dec!(7.000)), Some(dec!(7.125)), Some(dec!(7.250)), Some(dec!(7.375)), Some(dec!(7.500)), None],
            vec![Some(dec!(6.750)), Some(dec!(6.875)), Some(dec!(7.000)), Some(dec!(7.125)), Some(dec!(7.250)), Some(dec!(7.375))],
            vec![Some(dec!(6.550)), Some(dec!(6.675)), Some(dec!(6.800)), Some(dec!(6.925)), Some(dec!(7.000)), Some(dec!(7.125))],
            vec![Some(dec!(6.375)), Some(dec!(6.500)), Some(dec!(6.625)), Some(dec!(6.750)), Some(dec!(6.825)), Some(dec!(6.950))],
            vec![Some(dec!(6.250)), Some(dec!(6.375)), Some(dec!(6.500)), Some(dec!(6.625)), Some(dec!(6.700)), Some(dec!(6.825))],
            vec![Some(dec!(6.125)), Some(dec!(6.250)), Some(dec!(6.375)), Some(dec!(6.500)), Some(dec!(6.575)), Some(dec!(6.700))],
            vec![Some(dec!(6.000)), Some(dec!(6.125)), Some(dec!(6.250)), Some(dec!(6.375)), Some(dec!(6.450)), Some(dec!(6.575))],
        ],
        //                                        660    680    700    720    740    760    780
        fico_adjustments: BTreeMap::from([
            (LoanPurpose::Purchase, vec![dec!(0), dec!(0), dec!(0), dec!(0), dec!(0), dec!(0), dec!(0)]),
            (LoanPurpose::Refinance, vec![dec!(0.125), dec!(0.125), dec!(0), dec!(0), dec!(0), dec!(0), dec!(0)]),
            (LoanPurpose::CashOut, vec![dec!(0.750), dec!(0.500), dec!(0.375), dec!(0.250), dec!(0.250), dec!(0.125), dec!(0.125)]),
        ]),
        ltv_adjustments: BTreeMap::from([
            (PropertyType::SingleFamily, vec![Some(dec!(0)); 6]),
            (PropertyType::Townhome, vec![Some(dec!(0)); 6]),
            (
                PropertyType::Condo,
                vec![Some(dec!(0.125)), Some(dec!(0.125)), Some(dec!(0.125)), Some(dec!(0.250)), Some(dec!(0.250)), Some(dec!(0.375))],
            ),
            (
                PropertyType::TwoToFourUnit,
                vec![Some(dec!(0.125)), Some(dec!(0.125)), Some(dec!(0.250)), Some(dec!(0.250)), Some(dec!(0.375)), None],
            ),
        ]),
        products: vec![
            ProductTerms {
                product: Product::ThirtyYearFixed,
                term_years: 30,
                adjustment: dec!(0.200),
                interest_only_allowed: true,
            },
            ProductTerms {
                product: Product::FortyYearFixed,
                term_years: 40,
                adjustment: dec!(0.450),
                interest_only_allowed: true,
            },
            ProductTerms {
                product: Product::SevenSixArm,
                term_years: 30,
                adjustment: dec!(0.100),
                interest_only_allowed: true,
            },
            ProductTerms {
                product: Product::FiveSixArm,
                term_years: 30,
                adjustment: dec!(0.000),
                interest_only_allowed: false,
            },
        ],
        // −0.300 per point of broker compensation, up to 3 points
        origination_adjustments: quarter_point_grid(dec!(3), dec!(-0.075)),
        // +0.250 per point of YSP, up to 2 points
        ysp_adjustments: quarter_point_grid(dec!(2), dec!(0.0625)),
        // −0.250 per discount point, up to 3 points
        discount_point_adjustments: quarter_point_grid(dec!(3), dec!(-0.0625)),
        loan_size_bands: vec![
            size_band(Band::half_open(dec!(75000), dec!(100000)), dec!(0.500), dec!(0)),
            size_band(Band::half_open(dec!(100000), dec!(125000)), dec!(0.375), dec!(0)),
            size_band(Band::half_open(dec!(125000), dec!(250000)), dec!(0.250), dec!(0)),
            size_band(Band::half_open(dec!(250000), dec!(1000000)), dec!(0.000), dec!(0)),
            size_band(Band::half_open(dec!(1000000), dec!(1500000)), dec!(0.125), dec!(0)),
            size_band(Band::half_open(dec!(1500000), dec!(2000000)), dec!(0.250), dec!(500)),
            size_band(Band::closed(dec!(2000000), dec!(3000000)), dec!(0.375), dec!(750)),
        ],
        dscr_bands: vec![
            DscrBand {
                band: Band::half_open(dec!(0.75), dec!(1.00)),
                max_ltv: Some(dec!(65)),
                adjustment: Some(dec!(0.500)),
                provisional: false,
            },
            DscrBand {
                band: Band::closed(dec!(1.00), dec!(1.20)),
                max_ltv: None,
                adjustment: Some(dec!(0.175)),
                provisional: true,
            },
            DscrBand {
                band: Band::above(dec!(1.20)),
                max_ltv: None,
                adjustment: Some(dec!(-0.125)),
                provisional: false,
            },
        ],
        prepay_structures: BTreeMap::from([
            prepay("5/5/5/5/5", dec!(-0.250)),
            prepay("3/3/3", dec!(-0.175)),
            prepay("5/4/3/2/1", dec!(0.000)),
            prepay("3/2/1", dec!(0.250)),
            prepay("3/0/0", dec!(0.500)),
            prepay("0/0/0", dec!(1.000)),
            prepay("None", dec!(0.000)),
        ]),
        program_adjustments: ProgramAdjustments {
            short_term_rental: dec!(0.250),
            interest_only: dec!(0.250),
            states: BTreeMap::from([("NY".to_string(), dec!(0.125))]),
        },
        fees: FeeSchedule {
            underwriting_fee: dec!(1495),
            small_loan_threshold: dec!(100000),
            small_loan_fee: dec!(1000),
        },
    }
}

fn fico_tiers() -> Vec<FicoTier> {
    let tier = |label: &str, min: Decimal, max: Decimal| FicoTier {
        label: label.into(),
        band: Band::half_open(min, max),
    };
    vec![
        tier("660-679", dec!(660), dec!(680)),
        tier("680-699", dec!(680), dec!(700)),
        tier("700-719", dec!(700), dec!(720)),
        tier("720-739", dec!(720), dec!(740)),
        tier("740-759", dec!(740), dec!(760)),
        tier("760-779", dec!(760), dec!(780)),
        tier("780+", dec!(780), dec!(851)),
    ]
}

/// Entries at 0, 0.25, ... `max` points, each quarter point worth `step`.
fn quarter_point_grid(max: Decimal, step: Decimal) -> Vec<PointAdjustment> {
    let mut entries = Vec::new();
    let mut quarters = Decimal::ZERO;
    while quarters * dec!(0.25) <= max {
        entries.push(PointAdjustment {
            points: quarters * dec!(0.25),
            adjustment: quarters * step,
        });
        quarters += Decimal::ONE;
    }
    entries
}

fn size_band(band: Band, adjustment: Decimal, fee: Decimal) -> LoanSizeBand {
    LoanSizeBand {
        band,
        adjustment,
        fee,
    }
}

fn prepay(key: &str, adjustment: Decimal) -> (String, PrepayTerms) {
    (
        key.to_string(),
        PrepayTerms {
            adjustment,
            fee_points: Decimal::ZERO,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_point_grid() {
        let grid = quarter_point_grid(dec!(2), dec!(0.0625));
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[4].points, dec!(1));
        assert_eq!(grid[4].adjustment, dec!(0.25));
        assert_eq!(grid[8].points, dec!(2));
    }

    #[test]
    fn test_origination_one_point() {
        let sheet = standard_dscr_sheet();
        let entry = sheet
            .origination_adjustments
            .iter()
            .find(|e| e.points == dec!(1))
            .unwrap();
        assert_eq!(entry.adjustment, dec!(-0.300));
    }

    #[test]
    fn test_base_rate_reference_cell() {
        let sheet = standard_dscr_sheet();
        // 740-759 row, 75-80 column
        assert_eq!(sheet.base_rates[4][5], Some(dec!(6.825)));
        assert_eq!(sheet.fico_tiers[4].label, "740-759");
    }
}
