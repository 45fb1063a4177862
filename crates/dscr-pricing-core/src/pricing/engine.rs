use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::eligibility::{
    product_exclusion, program_exclusion, EligibilityExclusion, ExclusionCode,
};
use super::fees::{compute_fees, FeeBreakdown};
use super::input::{PricingInput, PricingRequest};
use crate::adjustments;
use crate::amortization::monthly_payment;
use crate::loan::Product;
use crate::rate_table::book::RateBook;
use crate::rate_table::sheet::{ProductTerms, RateSheet};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::PricingResult;

const METHODOLOGY: &str = "DSCR rate sheet pricing (base grid plus additive adjustments)";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Signed percentage-point components of a note rate. The final rate is the
/// exact sum of the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBreakdown {
    pub base_rate: Percent,
    pub fico_adjustment: Percent,
    pub ltv_adjustment: Percent,
    pub product_adjustment: Percent,
    pub dscr_adjustment: Percent,
    pub origination_fee_adjustment: Percent,
    pub loan_size_adjustment: Percent,
    pub program_adjustment: Percent,
    pub interest_only_adjustment: Percent,
    pub ysp_adjustment: Percent,
    pub prepay_adjustment: Percent,
    pub discount_points_adjustment: Percent,
}

impl RateBreakdown {
    /// Named components in presentation order.
    pub fn components(&self) -> [(&'static str, Percent); 12] {
        [
            ("base_rate", self.base_rate),
            ("fico_adjustment", self.fico_adjustment),
            ("ltv_adjustment", self.ltv_adjustment),
            ("product_adjustment", self.product_adjustment),
            ("dscr_adjustment", self.dscr_adjustment),
            ("origination_fee_adjustment", self.origination_fee_adjustment),
            ("loan_size_adjustment", self.loan_size_adjustment),
            ("program_adjustment", self.program_adjustment),
            ("interest_only_adjustment", self.interest_only_adjustment),
            ("ysp_adjustment", self.ysp_adjustment),
            ("prepay_adjustment", self.prepay_adjustment),
            ("discount_points_adjustment", self.discount_points_adjustment),
        ]
    }

    pub fn total(&self) -> Percent {
        self.components().iter().map(|(_, v)| *v).sum()
    }
}

/// One priced product for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanOption {
    pub lender_id: String,
    pub lender_name: String,
    pub program_id: String,
    pub rate_sheet_version: String,
    pub product: Product,
    pub base_rate: Percent,
    pub final_rate: Percent,
    /// Borrower-paid points: broker comp plus discount points
    pub points: Decimal,
    pub monthly_payment: Money,
    pub total_fees: Money,
    pub term_years: u32,
    pub loan_amount: Money,
    pub interest_only: bool,
    pub breakdown: RateBreakdown,
    pub fee_breakdown: FeeBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStatus {
    Priced,
    NoEligibleProducts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingOutput {
    pub program_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lender_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_sheet_version: Option<String>,
    pub status: PricingStatus,
    /// LTV the request was priced at
    pub ltv: Percent,
    /// Sorted by final rate, then product
    pub options: Vec<LoanOption>,
    pub exclusions: Vec<EligibilityExclusion>,
}

impl PricingOutput {
    /// Lowest-rate option, if any product priced.
    pub fn best(&self) -> Option<&LoanOption> {
        self.options.first()
    }

    fn excluded(sheet: &RateSheet, ltv: Percent, exclusion: EligibilityExclusion) -> Self {
        PricingOutput {
            program_id: sheet.program_id.clone(),
            lender_id: Some(sheet.lender_id.clone()),
            rate_sheet_version: Some(sheet.version.clone()),
            status: PricingStatus::NoEligibleProducts,
            ltv,
            options: Vec::new(),
            exclusions: vec![exclusion],
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price a request against the program it names (or the book's default
/// program). An unknown program excludes every product.
pub fn price_loan(
    request: &PricingRequest,
    book: &RateBook,
) -> PricingResult<ComputationOutput<PricingOutput>> {
    let start = Instant::now();
    let input = &request.input;
    input.validate()?;

    let mut warnings = Vec::new();
    let ltv = input.effective_ltv(&mut warnings)?;

    let program_id = request
        .program
        .as_deref()
        .unwrap_or_else(|| book.default_program());

    let output = match book.get(program_id) {
        Some(sheet) => price_against(sheet, input, ltv, &mut warnings)?,
        None => {
            tracing::info!(program = program_id, "program not offered");
            PricingOutput {
                program_id: program_id.to_string(),
                lender_id: None,
                rate_sheet_version: None,
                status: PricingStatus::NoEligibleProducts,
                ltv,
                options: Vec::new(),
                exclusions: vec![EligibilityExclusion::program(
                    ExclusionCode::ProgramNotOffered,
                    format!("Program '{program_id}' is not offered"),
                )],
            }
        }
    };

    Ok(finish(start, book.get(program_id), warnings, output))
}

/// Price a request against one explicit sheet, bypassing the rate book.
///
/// The sheet is validated first, so a malformed or out-of-range sheet is
/// rejected with `InvalidRateSheet` before any lookup.
pub fn price_with_sheet(
    sheet: &RateSheet,
    input: &PricingInput,
) -> PricingResult<ComputationOutput<PricingOutput>> {
    let start = Instant::now();
    let sheet_warnings = sheet.validate()?;
    tracing::debug!(
        program = %sheet.program_id,
        warnings = sheet_warnings.len(),
        "caller-supplied sheet validated"
    );
    input.validate()?;

    let mut warnings = Vec::new();
    let ltv = input.effective_ltv(&mut warnings)?;
    let output = price_against(sheet, input, ltv, &mut warnings)?;

    Ok(finish(start, Some(sheet), warnings, output))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Adjustments that do not depend on the product.
struct Shared {
    base_rate: Percent,
    fico: Percent,
    ltv: Percent,
    dscr: Percent,
    origination: Percent,
    loan_size: Percent,
    program: Percent,
    interest_only: Percent,
    ysp: Percent,
    prepay: Percent,
    discount_points: Percent,
}

fn price_against(
    sheet: &RateSheet,
    input: &PricingInput,
    ltv: Percent,
    warnings: &mut Vec<String>,
) -> PricingResult<PricingOutput> {
    // Keyed tables fail before eligibility so a bad key is never masked by
    // an exclusion.
    let prepay = adjustments::prepay_terms(sheet, &input.prepay_structure)?;
    let origination = adjustments::origination_adjustment(sheet, input.broker_comp)?;
    let ysp = adjustments::ysp_adjustment(sheet, input.ysp)?;
    let discount_points = adjustments::discount_points_adjustment(sheet, input.discount_points)?;

    if let Some(exclusion) = program_exclusion(sheet, input, ltv) {
        tracing::info!(
            program = %sheet.program_id,
            code = ?exclusion.code,
            "request excluded by program eligibility"
        );
        return Ok(PricingOutput::excluded(sheet, ltv, exclusion));
    }

    let Some(base_rate) = adjustments::base_rate(sheet, input.fico, ltv)? else {
        return Ok(PricingOutput::excluded(
            sheet,
            ltv,
            EligibilityExclusion::program(
                ExclusionCode::RateNotOffered,
                format!("No base rate for FICO {} at LTV {ltv}", input.fico),
            ),
        ));
    };
    let Some(ltv_adj) = adjustments::ltv_adjustment(sheet, input.property_type, ltv)? else {
        return Ok(PricingOutput::excluded(
            sheet,
            ltv,
            EligibilityExclusion::program(
                ExclusionCode::RateNotOffered,
                format!("{} is not offered at LTV {ltv}", input.property_type),
            ),
        ));
    };

    let fico = adjustments::fico_adjustment(sheet, input.loan_purpose, input.fico)?;
    let dscr = adjustments::dscr_adjustment(sheet, input.dscr, ltv)?;
    if dscr.provisional {
        tracing::warn!(band = %dscr.band, dscr = %input.dscr, "provisional DSCR band used");
        warnings.push(format!(
            "DSCR band {} adjustment {} is provisional and awaiting confirmation",
            dscr.band, dscr.adjustment
        ));
    }
    let size_band = adjustments::loan_size_band(sheet, input.loan_amount)?;

    let shared = Shared {
        base_rate,
        fico,
        ltv: ltv_adj,
        dscr: dscr.adjustment,
        origination,
        loan_size: size_band.adjustment,
        program: adjustments::program_adjustment(
            sheet,
            &input.property_state,
            input.is_short_term_rental,
        ),
        interest_only: adjustments::interest_only_adjustment(sheet, input.interest_only),
        ysp,
        prepay: prepay.adjustment,
        discount_points,
    };
    tracing::debug!(
        base_rate = %shared.base_rate,
        fico = %shared.fico,
        ltv = %shared.ltv,
        dscr = %shared.dscr,
        origination = %shared.origination,
        loan_size = %shared.loan_size,
        program = %shared.program,
        interest_only = %shared.interest_only,
        ysp = %shared.ysp,
        prepay = %shared.prepay,
        discount_points = %shared.discount_points,
        "shared adjustments resolved"
    );

    let fee_breakdown = compute_fees(sheet, input, size_band, prepay);
    let total_fees = fee_breakdown.total();

    let mut options = Vec::new();
    let mut exclusions = Vec::new();

    for terms in candidate_products(sheet, input, &mut exclusions) {
        if let Some(exclusion) = product_exclusion(terms, input) {
            exclusions.push(exclusion);
            continue;
        }

        let breakdown = RateBreakdown {
            base_rate: shared.base_rate,
            fico_adjustment: shared.fico,
            ltv_adjustment: shared.ltv,
            product_adjustment: terms.adjustment,
            dscr_adjustment: shared.dscr,
            origination_fee_adjustment: shared.origination,
            loan_size_adjustment: shared.loan_size,
            program_adjustment: shared.program,
            interest_only_adjustment: shared.interest_only,
            ysp_adjustment: shared.ysp,
            prepay_adjustment: shared.prepay,
            discount_points_adjustment: shared.discount_points,
        };
        let final_rate = breakdown.total();
        let payment = monthly_payment(
            input.loan_amount,
            final_rate,
            terms.term_years,
            input.interest_only,
        )?;

        tracing::debug!(product = %terms.product, %final_rate, %payment, "product priced");

        options.push(LoanOption {
            lender_id: sheet.lender_id.clone(),
            lender_name: sheet.lender_name.clone(),
            program_id: sheet.program_id.clone(),
            rate_sheet_version: sheet.version.clone(),
            product: terms.product,
            base_rate: shared.base_rate,
            final_rate,
            points: input.broker_comp + input.discount_points,
            monthly_payment: payment,
            total_fees,
            term_years: terms.term_years,
            loan_amount: input.loan_amount,
            interest_only: input.interest_only,
            breakdown,
            fee_breakdown: fee_breakdown.clone(),
        });
    }

    // Equal rates keep the sheet's product order.
    let declared = |product: Product| sheet.products.iter().position(|p| p.product == product);
    options.sort_by(|a, b| {
        a.final_rate
            .cmp(&b.final_rate)
            .then_with(|| declared(a.product).cmp(&declared(b.product)))
    });

    let status = if options.is_empty() {
        PricingStatus::NoEligibleProducts
    } else {
        PricingStatus::Priced
    };

    tracing::info!(
        program = %sheet.program_id,
        options = options.len(),
        exclusions = exclusions.len(),
        best_rate = ?options.first().map(|o| o.final_rate),
        "request priced"
    );

    Ok(PricingOutput {
        program_id: sheet.program_id.clone(),
        lender_id: Some(sheet.lender_id.clone()),
        rate_sheet_version: Some(sheet.version.clone()),
        status,
        ltv,
        options,
        exclusions,
    })
}

/// Products to price: the requested one if it is on the sheet, otherwise
/// every product the sheet offers.
fn candidate_products<'a>(
    sheet: &'a RateSheet,
    input: &PricingInput,
    exclusions: &mut Vec<EligibilityExclusion>,
) -> Vec<&'a ProductTerms> {
    match input.product {
        Some(product) => match sheet.product_terms(product) {
            Some(terms) => vec![terms],
            None => {
                exclusions.push(EligibilityExclusion::product(
                    product,
                    ExclusionCode::ProductNotOffered,
                    format!("{product} is not offered by {}", sheet.program_id),
                ));
                Vec::new()
            }
        },
        None => sheet.products.iter().collect(),
    }
}

fn finish(
    start: Instant,
    sheet: Option<&RateSheet>,
    warnings: Vec<String>,
    output: PricingOutput,
) -> ComputationOutput<PricingOutput> {
    let assumptions = serde_json::json!({
        "program_id": output.program_id,
        "rate_sheet_version": sheet.map(|s| s.version.clone()),
        "effective_date": sheet.map(|s| s.effective_date.to_string()),
        "ltv_source": "loan_amount / estimated_home_value when the value is known",
        "adjustments": "additive percentage points against the original input",
        "interest_only_payment": "loan_amount × final_rate / 12",
    });
    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(METHODOLOGY, &assumptions, warnings, elapsed, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PricingError;
    use crate::loan::{LoanPurpose, OccupancyType, PropertyType};
    use crate::rate_table::standard::standard_dscr_sheet;
    use rust_decimal_macros::dec;

    fn sample_input() -> PricingInput {
        PricingInput {
            fico: 745,
            ltv: Some(dec!(80)),
            loan_amount: dec!(160000),
            loan_purpose: LoanPurpose::Purchase,
            property_type: PropertyType::SingleFamily,
            property_state: "TX".into(),
            occupancy_type: OccupancyType::Investment,
            product: Some(Product::ThirtyYearFixed),
            interest_only: false,
            prepay_structure: "5/4/3/2/1".into(),
            dscr: dec!(1.10),
            broker_comp: dec!(1),
            ysp: dec!(1),
            discount_points: Decimal::ZERO,
            broker_admin_fee: Decimal::ZERO,
            estimated_home_value: Some(dec!(200000)),
            monthly_rental_income: dec!(5000),
            annual_property_insurance: dec!(1200),
            annual_property_taxes: dec!(3600),
            monthly_hoa_fee: dec!(600),
            is_short_term_rental: false,
            units: 1,
        }
    }

    fn request(input: PricingInput) -> PricingRequest {
        PricingRequest {
            program: None,
            input,
        }
    }

    #[test]
    fn test_reference_loan_breakdown() {
        let out = price_loan(&request(sample_input()), RateBook::standard()).unwrap();
        let option = out.result.best().unwrap();
        let b = &option.breakdown;

        assert_eq!(b.base_rate, dec!(6.825));
        assert_eq!(b.product_adjustment, dec!(0.200));
        assert_eq!(b.origination_fee_adjustment, dec!(-0.300));
        assert_eq!(b.loan_size_adjustment, dec!(0.250));
        assert_eq!(b.ysp_adjustment, dec!(0.250));
        assert_eq!(b.prepay_adjustment, dec!(0.000));
        assert_eq!(b.dscr_adjustment, dec!(0.175));
        assert_eq!(option.final_rate, dec!(7.400));
        assert_eq!(option.final_rate - b.dscr_adjustment, dec!(7.225));
        assert_eq!(option.points, dec!(1));
    }

    #[test]
    fn test_final_rate_is_breakdown_sum() {
        let mut input = sample_input();
        input.product = None;
        let out = price_loan(&request(input), RateBook::standard()).unwrap();
        assert_eq!(out.result.options.len(), 4);
        for option in &out.result.options {
            assert_eq!(option.final_rate, option.breakdown.total());
        }
    }

    #[test]
    fn test_options_sorted_by_rate() {
        let mut input = sample_input();
        input.product = None;
        let out = price_loan(&request(input), RateBook::standard()).unwrap();
        let products: Vec<Product> = out.result.options.iter().map(|o| o.product).collect();
        assert_eq!(
            products,
            vec![
                Product::FiveSixArm,
                Product::SevenSixArm,
                Product::ThirtyYearFixed,
                Product::FortyYearFixed
            ]
        );
    }

    #[test]
    fn test_provisional_band_warns() {
        let out = price_loan(&request(sample_input()), RateBook::standard()).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("provisional")));

        let mut input = sample_input();
        input.dscr = dec!(1.35);
        let out = price_loan(&request(input), RateBook::standard()).unwrap();
        assert!(!out.warnings.iter().any(|w| w.contains("provisional")));
        assert_eq!(out.result.options[0].breakdown.dscr_adjustment, dec!(-0.125));
    }

    #[test]
    fn test_unknown_program_excludes_everything() {
        let req = PricingRequest {
            program: Some("jumbo-nonqm".into()),
            input: sample_input(),
        };
        let out = price_loan(&req, RateBook::standard()).unwrap();
        assert_eq!(out.result.status, PricingStatus::NoEligibleProducts);
        assert_eq!(out.result.exclusions[0].code, ExclusionCode::ProgramNotOffered);
        assert!(out.result.lender_id.is_none());
    }

    #[test]
    fn test_unknown_prepay_is_error_even_when_ineligible() {
        let mut input = sample_input();
        input.prepay_structure = "4/4/4".into();
        input.property_type = PropertyType::MultiFamily;
        input.units = 6;
        let err = price_loan(&request(input), RateBook::standard()).unwrap_err();
        assert!(matches!(err, PricingError::DataGap { ref table, .. } if table == "prepay_structures"));
    }

    #[test]
    fn test_null_grid_cell_is_exclusion() {
        let mut input = sample_input();
        input.fico = 665;
        let out = price_loan(&request(input), RateBook::standard()).unwrap();
        assert_eq!(out.result.status, PricingStatus::NoEligibleProducts);
        assert_eq!(out.result.exclusions[0].code, ExclusionCode::RateNotOffered);
    }

    #[test]
    fn test_interest_only_payment_and_exclusion() {
        let mut input = sample_input();
        input.product = None;
        input.interest_only = true;
        let out = price_loan(&request(input), RateBook::standard()).unwrap();

        assert_eq!(out.result.options.len(), 3);
        assert_eq!(out.result.exclusions.len(), 1);
        assert_eq!(out.result.exclusions[0].product, Some(Product::FiveSixArm));

        for option in &out.result.options {
            assert_eq!(option.breakdown.interest_only_adjustment, dec!(0.250));
            let expected = option.loan_amount * option.final_rate / dec!(1200);
            assert!((option.monthly_payment - expected).abs() < dec!(0.0000001));
        }
    }

    #[test]
    fn test_price_with_sheet_undefined_band_fails() {
        let mut sheet = standard_dscr_sheet();
        for band in sheet.dscr_bands.iter_mut().filter(|b| b.provisional) {
            band.adjustment = None;
        }
        let err = price_with_sheet(&sheet, &sample_input()).unwrap_err();
        assert!(matches!(err, PricingError::UndefinedBand { .. }));
    }

    #[test]
    fn test_price_with_sheet_rejects_invalid_sheet() {
        let mut sheet = standard_dscr_sheet();
        sheet.products[0].term_years = 1000;
        let err = price_with_sheet(&sheet, &sample_input()).unwrap_err();
        assert!(matches!(err, PricingError::InvalidRateSheet { .. }));

        let mut sheet = standard_dscr_sheet();
        sheet.base_rates[0].pop();
        assert!(price_with_sheet(&sheet, &sample_input()).is_err());
    }

    #[test]
    fn test_equal_rates_keep_sheet_product_order() {
        let mut sheet = standard_dscr_sheet();
        sheet.products.reverse();
        for terms in &mut sheet.products {
            terms.adjustment = Decimal::ZERO;
        }
        let mut input = sample_input();
        input.product = None;

        let out = price_with_sheet(&sheet, &input).unwrap();
        let rates: Vec<Decimal> = out.result.options.iter().map(|o| o.final_rate).collect();
        assert!(rates.windows(2).all(|w| w[0] == w[1]));

        let priced: Vec<Product> = out.result.options.iter().map(|o| o.product).collect();
        let declared: Vec<Product> = sheet.products.iter().map(|p| p.product).collect();
        assert_eq!(priced, declared);
        assert_eq!(priced[0], Product::FiveSixArm);
    }

    #[test]
    fn test_requested_product_missing_from_sheet() {
        let mut sheet = standard_dscr_sheet();
        sheet.products.retain(|p| p.product != Product::FortyYearFixed);
        let mut input = sample_input();
        input.product = Some(Product::FortyYearFixed);
        let out = price_with_sheet(&sheet, &input).unwrap();
        assert_eq!(out.result.status, PricingStatus::NoEligibleProducts);
        assert_eq!(out.result.exclusions[0].code, ExclusionCode::ProductNotOffered);
    }
}
