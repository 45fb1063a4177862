use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::bands::{Band, Coverage};
use crate::error::PricingError;
use crate::loan::{LoanPurpose, OccupancyType, Product, PropertyType};
use crate::amortization::{MAX_NOTE_RATE, MAX_TERM_YEARS};
use crate::types::{Money, Multiple, Percent, MAX_AMOUNT};
use crate::PricingResult;

const MAX_FICO: u16 = 850;
/// Ceiling for any points value (broker comp, YSP, discount, prepay fee).
const MAX_POINTS: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One program's complete, versioned pricing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSheet {
    pub program_id: String,
    pub lender_id: String,
    pub lender_name: String,
    pub version: String,
    pub effective_date: NaiveDate,
    pub eligibility: EligibilityRules,
    /// Credit score tiers, `[min, max)`, ascending.
    pub fico_tiers: Vec<FicoTier>,
    /// LTV bands, `(min, max]`, ascending.
    pub ltv_bands: Vec<Band>,
    /// Base note rate indexed `[fico tier][ltv band]`. `None` = not offered.
    pub base_rates: Vec<Vec<Option<Percent>>>,
    /// Loan-purpose adjustment per FICO tier.
    pub fico_adjustments: BTreeMap<LoanPurpose, Vec<Percent>>,
    /// Property-type adjustment per LTV band. Types without a row are not
    /// eligible; `None` cells are not offered at that LTV.
    pub ltv_adjustments: BTreeMap<PropertyType, Vec<Option<Percent>>>,
    pub products: Vec<ProductTerms>,
    /// Broker compensation (points) → rate adjustment.
    pub origination_adjustments: Vec<PointAdjustment>,
    /// Yield spread premium (points) → rate adjustment.
    pub ysp_adjustments: Vec<PointAdjustment>,
    /// Discount points bought → rate adjustment.
    pub discount_point_adjustments: Vec<PointAdjustment>,
    /// Loan amount bands, `[min, max)` with the last closed at the program max.
    pub loan_size_bands: Vec<LoanSizeBand>,
    pub dscr_bands: Vec<DscrBand>,
    /// Prepayment penalty structure key → terms. Keys match exactly.
    pub prepay_structures: BTreeMap<String, PrepayTerms>,
    pub program_adjustments: ProgramAdjustments,
    pub fees: FeeSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityRules {
    pub min_fico: u16,
    pub max_ltv: BTreeMap<LoanPurpose, Percent>,
    pub min_loan_amount: Money,
    pub max_loan_amount: Money,
    pub min_dscr: Multiple,
    /// Maximum LTV when DSCR is below 1.00.
    pub sub_one_dscr_max_ltv: Percent,
    pub eligible_occupancies: Vec<OccupancyType>,
    #[serde(default)]
    pub excluded_states: Vec<String>,
    pub interest_only_min_fico: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FicoTier {
    pub label: String,
    pub band: Band,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTerms {
    pub product: Product,
    pub term_years: u32,
    pub adjustment: Percent,
    pub interest_only_allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointAdjustment {
    pub points: Decimal,
    pub adjustment: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSizeBand {
    pub band: Band,
    pub adjustment: Percent,
    #[serde(default)]
    pub fee: Money,
}

/// A DSCR pricing band. `adjustment: None` marks a band whose value is still
/// undecided; resolving into it fails with [`PricingError::UndefinedBand`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrBand {
    pub band: Band,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ltv: Option<Percent>,
    pub adjustment: Option<Percent>,
    #[serde(default)]
    pub provisional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepayTerms {
    pub adjustment: Percent,
    #[serde(default)]
    pub fee_points: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramAdjustments {
    pub short_term_rental: Percent,
    pub interest_only: Percent,
    #[serde(default)]
    pub states: BTreeMap<String, Percent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub underwriting_fee: Money,
    /// Loans strictly below this amount pay `small_loan_fee`.
    pub small_loan_threshold: Money,
    pub small_loan_fee: Money,
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

impl RateSheet {
    pub fn product_terms(&self, product: Product) -> Option<&ProductTerms> {
        self.products.iter().find(|p| p.product == product)
    }

    /// Products in sheet order.
    pub fn offered_products(&self) -> impl Iterator<Item = Product> + '_ {
        self.products.iter().map(|p| p.product)
    }

    pub fn max_ltv_for(&self, purpose: LoanPurpose) -> Option<Percent> {
        self.eligibility.max_ltv.get(&purpose).copied()
    }

    pub fn is_provisional(&self) -> bool {
        self.dscr_bands.iter().any(|b| b.provisional)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl RateSheet {
    /// Check the sheet is total over its eligible domain.
    ///
    /// Structural defects (gaps, overlaps, misaligned rows, missing keys) are
    /// errors. Undefined and provisional DSCR bands are returned as warnings.
    pub fn validate(&self) -> PricingResult<Vec<String>> {
        let mut warnings = Vec::new();
        let program = self.program_id.as_str();
        let fail = |reason: String| PricingError::InvalidRateSheet {
            program: program.to_string(),
            reason,
        };

        if program.trim().is_empty() {
            return Err(fail("program_id must not be empty".into()));
        }

        self.validate_eligibility()?;

        // --- FICO × LTV grid ---
        let fico_cov = Coverage {
            table: "fico_tiers",
            domain: Band::closed(
                Decimal::from(self.eligibility.min_fico),
                Decimal::from(MAX_FICO),
            ),
        };
        let fico_bands: Vec<&Band> = self.fico_tiers.iter().map(|t| &t.band).collect();
        fico_cov.check(program, &fico_bands)?;

        let max_ltv = self
            .eligibility
            .max_ltv
            .values()
            .copied()
            .max()
            .unwrap_or(Decimal::ZERO);
        let ltv_cov = Coverage {
            table: "ltv_bands",
            domain: Band::upper_closed(Decimal::ZERO, max_ltv),
        };
        let ltv_bands: Vec<&Band> = self.ltv_bands.iter().collect();
        ltv_cov.check(program, &ltv_bands)?;

        let tiers = self.fico_tiers.len();
        let cols = self.ltv_bands.len();

        if self.base_rates.len() != tiers {
            return Err(fail(format!(
                "base_rates has {} rows for {tiers} FICO tiers",
                self.base_rates.len()
            )));
        }
        for (i, row) in self.base_rates.iter().enumerate() {
            if row.len() != cols {
                return Err(fail(format!(
                    "base_rates row {} ({}) has {} cells for {cols} LTV bands",
                    i,
                    self.fico_tiers[i].label,
                    row.len()
                )));
            }
        }

        for purpose in [LoanPurpose::Purchase, LoanPurpose::Refinance, LoanPurpose::CashOut] {
            match self.fico_adjustments.get(&purpose) {
                Some(row) if row.len() == tiers => {}
                Some(row) => {
                    return Err(fail(format!(
                        "fico_adjustments[{purpose}] has {} entries for {tiers} FICO tiers",
                        row.len()
                    )));
                }
                None => return Err(fail(format!("fico_adjustments missing {purpose}"))),
            }
        }

        for (property_type, row) in &self.ltv_adjustments {
            if row.len() != cols {
                return Err(fail(format!(
                    "ltv_adjustments[{property_type}] has {} entries for {cols} LTV bands",
                    row.len()
                )));
            }
        }

        // --- Products ---
        if self.products.is_empty() {
            return Err(fail("at least one product is required".into()));
        }
        let mut seen = BTreeSet::new();
        for p in &self.products {
            if !seen.insert(p.product) {
                return Err(fail(format!("product {} listed twice", p.product)));
            }
            if p.term_years == 0 || p.term_years > MAX_TERM_YEARS {
                return Err(fail(format!(
                    "product {} term of {} years is outside 1..={MAX_TERM_YEARS}",
                    p.product, p.term_years
                )));
            }
        }

        // --- Discrete point tables ---
        check_point_table(program, "origination_adjustments", &self.origination_adjustments)?;
        check_point_table(program, "ysp_adjustments", &self.ysp_adjustments)?;
        check_point_table(
            program,
            "discount_point_adjustments",
            &self.discount_point_adjustments,
        )?;

        // --- Loan size ---
        let size_cov = Coverage {
            table: "loan_size_bands",
            domain: Band::closed(
                self.eligibility.min_loan_amount,
                self.eligibility.max_loan_amount,
            ),
        };
        let size_bands: Vec<&Band> = self.loan_size_bands.iter().map(|b| &b.band).collect();
        size_cov.check(program, &size_bands)?;

        // --- DSCR ---
        let dscr_cov = Coverage {
            table: "dscr_bands",
            domain: Band::at_least(self.eligibility.min_dscr),
        };
        let dscr_bands: Vec<&Band> = self.dscr_bands.iter().map(|b| &b.band).collect();
        dscr_cov.check(program, &dscr_bands)?;

        for band in &self.dscr_bands {
            if let Some(cap) = band.max_ltv {
                if cap < self.eligibility.sub_one_dscr_max_ltv {
                    return Err(fail(format!(
                        "dscr band {} caps LTV at {cap}, below the eligibility cap {}",
                        band.band, self.eligibility.sub_one_dscr_max_ltv
                    )));
                }
            }
            match band.adjustment {
                None => warnings.push(format!(
                    "DSCR band {} has no configured adjustment; requests in this band will fail",
                    band.band
                )),
                Some(adj) if band.provisional => warnings.push(format!(
                    "DSCR band {} adjustment {adj} is provisional pending confirmation",
                    band.band
                )),
                Some(_) => {}
            }
        }

        // --- Prepay / program / fees ---
        if !self.prepay_structures.contains_key("None") {
            return Err(fail("prepay_structures must define \"None\"".into()));
        }
        for state in self.program_adjustments.states.keys() {
            if !is_state_code(state) {
                return Err(fail(format!("program_adjustments.states key '{state}' is not a state code")));
            }
        }
        let fees = [self.fees.underwriting_fee, self.fees.small_loan_fee]
            .into_iter()
            .chain(self.loan_size_bands.iter().map(|b| b.fee));
        for fee in fees {
            if fee < Decimal::ZERO || fee > MAX_AMOUNT {
                return Err(fail(format!("fee {fee} is outside 0..={MAX_AMOUNT}")));
            }
        }
        for (key, terms) in &self.prepay_structures {
            if terms.fee_points < Decimal::ZERO || terms.fee_points > MAX_POINTS {
                return Err(fail(format!(
                    "prepay_structures[{key}] fee points {} are outside 0..={MAX_POINTS}",
                    terms.fee_points
                )));
            }
        }
        self.check_rate_magnitudes()?;

        Ok(warnings)
    }

    /// Every rate and adjustment must lie within ±`MAX_NOTE_RATE` points.
    fn check_rate_magnitudes(&self) -> PricingResult<()> {
        let program = &self.program_adjustments;
        let rates = self
            .base_rates
            .iter()
            .flatten()
            .flatten()
            .map(|v| ("base_rates", *v))
            .chain(
                self.fico_adjustments
                    .values()
                    .flatten()
                    .map(|v| ("fico_adjustments", *v)),
            )
            .chain(
                self.ltv_adjustments
                    .values()
                    .flatten()
                    .flatten()
                    .map(|v| ("ltv_adjustments", *v)),
            )
            .chain(self.products.iter().map(|p| ("products", p.adjustment)))
            .chain(
                self.origination_adjustments
                    .iter()
                    .map(|e| ("origination_adjustments", e.adjustment)),
            )
            .chain(self.ysp_adjustments.iter().map(|e| ("ysp_adjustments", e.adjustment)))
            .chain(
                self.discount_point_adjustments
                    .iter()
                    .map(|e| ("discount_point_adjustments", e.adjustment)),
            )
            .chain(self.loan_size_bands.iter().map(|b| ("loan_size_bands", b.adjustment)))
            .chain(
                self.dscr_bands
                    .iter()
                    .filter_map(|b| b.adjustment)
                    .map(|v| ("dscr_bands", v)),
            )
            .chain(
                self.prepay_structures
                    .values()
                    .map(|t| ("prepay_structures", t.adjustment)),
            )
            .chain([
                ("program_adjustments", program.short_term_rental),
                ("program_adjustments", program.interest_only),
            ])
            .chain(program.states.values().map(|v| ("program_adjustments", *v)));

        for (table, value) in rates {
            if value.abs() > MAX_NOTE_RATE {
                return Err(PricingError::InvalidRateSheet {
                    program: self.program_id.clone(),
                    reason: format!("{table}: {value} is outside ±{MAX_NOTE_RATE} points"),
                });
            }
        }
        Ok(())
    }

    fn validate_eligibility(&self) -> PricingResult<()> {
        let e = &self.eligibility;
        let fail = |reason: &str| PricingError::InvalidRateSheet {
            program: self.program_id.clone(),
            reason: format!("eligibility: {reason}"),
        };

        if e.min_fico == 0 || e.min_fico > MAX_FICO {
            return Err(fail("min_fico must be between 1 and 850"));
        }
        for purpose in [LoanPurpose::Purchase, LoanPurpose::Refinance, LoanPurpose::CashOut] {
            match e.max_ltv.get(&purpose) {
                Some(ltv) if *ltv > Decimal::ZERO && *ltv <= dec!(100) => {}
                Some(_) => return Err(fail("max_ltv must be in (0, 100]")),
                None => return Err(fail("max_ltv must cover every loan purpose")),
            }
        }
        if e.min_loan_amount <= Decimal::ZERO || e.min_loan_amount >= e.max_loan_amount {
            return Err(fail("loan amount limits must satisfy 0 < min < max"));
        }
        if e.max_loan_amount > MAX_AMOUNT {
            return Err(fail("max_loan_amount exceeds the supported ceiling"));
        }
        if e.min_dscr <= Decimal::ZERO {
            return Err(fail("min_dscr must be positive"));
        }
        if e.eligible_occupancies.is_empty() {
            return Err(fail("at least one occupancy must be eligible"));
        }
        if e.excluded_states.iter().any(|s| !is_state_code(s)) {
            return Err(fail("excluded_states must be two-letter state codes"));
        }
        Ok(())
    }
}

fn check_point_table(program: &str, table: &str, entries: &[PointAdjustment]) -> PricingResult<()> {
    let fail = |reason: String| PricingError::InvalidRateSheet {
        program: program.to_string(),
        reason: format!("{table}: {reason}"),
    };

    if !entries.iter().any(|e| e.points.is_zero()) {
        return Err(fail("must define a zero-point entry".into()));
    }
    for pair in entries.windows(2) {
        if pair[1].points <= pair[0].points {
            return Err(fail(format!(
                "points must be strictly ascending ({} then {})",
                pair[0].points, pair[1].points
            )));
        }
    }
    if entries.iter().any(|e| e.points < Decimal::ZERO || e.points > MAX_POINTS) {
        return Err(fail(format!("points must be within 0..={MAX_POINTS}")));
    }
    Ok(())
}

pub(crate) fn is_state_code(s: &str) -> bool {
    s.len() == 2 && s.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_table::standard::standard_dscr_sheet;

    #[test]
    fn test_standard_sheet_is_valid() {
        let warnings = standard_dscr_sheet().validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("[1.00, 1.20]"));
        assert!(warnings[0].contains("provisional"));
    }

    #[test]
    fn test_misaligned_grid_rejected() {
        let mut sheet = standard_dscr_sheet();
        sheet.base_rates[0].pop();
        let err = sheet.validate().unwrap_err();
        assert!(matches!(err, PricingError::InvalidRateSheet { .. }));
    }

    #[test]
    fn test_missing_none_prepay_rejected() {
        let mut sheet = standard_dscr_sheet();
        sheet.prepay_structures.remove("None");
        assert!(sheet.validate().is_err());
    }

    #[test]
    fn test_fico_gap_rejected() {
        let mut sheet = standard_dscr_sheet();
        // Drop a middle tier and its grid row: scores in that tier become a gap
        sheet.fico_tiers.remove(3);
        sheet.base_rates.remove(3);
        for row in sheet.fico_adjustments.values_mut() {
            row.remove(3);
        }
        let err = sheet.validate().unwrap_err();
        assert!(err.to_string().contains("fico_tiers"));
    }

    #[test]
    fn test_undefined_band_is_warning_not_error() {
        let mut sheet = standard_dscr_sheet();
        for band in &mut sheet.dscr_bands {
            if band.provisional {
                band.adjustment = None;
                band.provisional = false;
            }
        }
        let warnings = sheet.validate().unwrap();
        assert!(warnings.iter().any(|w| w.contains("no configured adjustment")));
    }

    #[test]
    fn test_unsorted_point_table_rejected() {
        let mut sheet = standard_dscr_sheet();
        sheet.ysp_adjustments.reverse();
        assert!(sheet.validate().is_err());
    }

    #[test]
    fn test_product_term_bounds() {
        for term in [0, MAX_TERM_YEARS + 1, 1000] {
            let mut sheet = standard_dscr_sheet();
            sheet.products[0].term_years = term;
            let err = sheet.validate().unwrap_err();
            assert!(err.to_string().contains("term"), "{err}");
        }
        let mut sheet = standard_dscr_sheet();
        sheet.products[0].term_years = MAX_TERM_YEARS;
        assert!(sheet.validate().is_ok());
    }

    #[test]
    fn test_outsized_rates_and_amounts_rejected() {
        let mut sheet = standard_dscr_sheet();
        sheet.base_rates[0][0] = Some(dec!(250));
        assert!(sheet.validate().unwrap_err().to_string().contains("base_rates"));

        let mut sheet = standard_dscr_sheet();
        sheet.program_adjustments.interest_only = dec!(-101);
        assert!(sheet.validate().unwrap_err().to_string().contains("program_adjustments"));

        let mut sheet = standard_dscr_sheet();
        sheet.eligibility.max_loan_amount = Decimal::MAX;
        assert!(sheet.validate().is_err());

        let mut sheet = standard_dscr_sheet();
        sheet.fees.underwriting_fee = MAX_AMOUNT + dec!(1);
        assert!(sheet.validate().unwrap_err().to_string().contains("fee"));

        let mut sheet = standard_dscr_sheet();
        if let Some(terms) = sheet.prepay_structures.get_mut("None") {
            terms.fee_points = dec!(150);
        }
        assert!(sheet.validate().is_err());
    }

    #[test]
    fn test_state_code_format() {
        assert!(is_state_code("NY"));
        assert!(!is_state_code("ny"));
        assert!(!is_state_code("NEW"));
    }
}
