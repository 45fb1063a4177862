//! Per-category rate adjustment resolvers.
//!
//! Each resolver maps one input dimension to one signed adjustment using a
//! rate sheet, and fails with a typed error rather than returning zero when
//! the value is not covered. Boundary conventions per table:
//!
//! | table | convention |
//! |---|---|
//! | FICO tiers | `[min, max)` |
//! | LTV bands | `(min, max]` |
//! | loan size | `[min, max)`, last band closed at the program maximum |
//! | DSCR | per band; standard sheet `[0.75, 1.00)`, `[1.00, 1.20]`, `(1.20, ∞)` |
//! | broker comp, YSP, discount points, prepay | exact match |
//!
//! `Ok(None)` from the grid resolvers means "not offered" and is an
//! eligibility outcome for the engine, not an error.

use rust_decimal::Decimal;

use crate::error::PricingError;
use crate::loan::{LoanPurpose, Product, PropertyType};
use crate::rate_table::bands::{find_band, Band};
use crate::rate_table::sheet::{LoanSizeBand, PointAdjustment, PrepayTerms, RateSheet};
use crate::types::{Money, Multiple, Percent};
use crate::PricingResult;

/// Index of the FICO tier containing `fico`.
pub fn fico_tier(sheet: &RateSheet, fico: u16) -> PricingResult<usize> {
    find_band(
        &sheet.fico_tiers,
        |t| &t.band,
        Decimal::from(fico),
        &sheet.program_id,
        "fico_tiers",
    )
    .map(|(i, _)| i)
}

/// Index of the LTV band containing `ltv`.
pub fn ltv_band(sheet: &RateSheet, ltv: Percent) -> PricingResult<usize> {
    find_band(&sheet.ltv_bands, |b| b, ltv, &sheet.program_id, "ltv_bands").map(|(i, _)| i)
}

/// Base note rate from the FICO × LTV grid.
pub fn base_rate(sheet: &RateSheet, fico: u16, ltv: Percent) -> PricingResult<Option<Percent>> {
    let row = fico_tier(sheet, fico)?;
    let col = ltv_band(sheet, ltv)?;
    sheet
        .base_rates
        .get(row)
        .and_then(|r| r.get(col))
        .copied()
        .ok_or_else(|| PricingError::gap("base_rates", format!("FICO {fico} / LTV {ltv}")))
}

/// Loan-purpose adjustment for the borrower's FICO tier.
pub fn fico_adjustment(sheet: &RateSheet, purpose: LoanPurpose, fico: u16) -> PricingResult<Percent> {
    let tier = fico_tier(sheet, fico)?;
    sheet
        .fico_adjustments
        .get(&purpose)
        .and_then(|row| row.get(tier))
        .copied()
        .ok_or_else(|| PricingError::gap("fico_adjustments", format!("{purpose} / FICO {fico}")))
}

/// Property-type adjustment for the LTV band.
pub fn ltv_adjustment(
    sheet: &RateSheet,
    property_type: PropertyType,
    ltv: Percent,
) -> PricingResult<Option<Percent>> {
    let col = ltv_band(sheet, ltv)?;
    sheet
        .ltv_adjustments
        .get(&property_type)
        .and_then(|row| row.get(col))
        .copied()
        .ok_or_else(|| PricingError::gap("ltv_adjustments", format!("{property_type} / LTV {ltv}")))
}

pub fn product_adjustment(sheet: &RateSheet, product: Product) -> PricingResult<Percent> {
    sheet
        .product_terms(product)
        .map(|t| t.adjustment)
        .ok_or_else(|| PricingError::gap("products", product))
}

/// Resolved DSCR band.
#[derive(Debug, Clone, PartialEq)]
pub struct DscrResolution {
    pub adjustment: Percent,
    pub band: Band,
    pub provisional: bool,
}

/// DSCR adjustment. A band without a configured value fails with
/// [`PricingError::UndefinedBand`]; a band whose LTV cap the loan exceeds is
/// a gap.
pub fn dscr_adjustment(sheet: &RateSheet, dscr: Multiple, ltv: Percent) -> PricingResult<DscrResolution> {
    let (_, entry) = find_band(&sheet.dscr_bands, |b| &b.band, dscr, &sheet.program_id, "dscr_bands")?;

    if let Some(cap) = entry.max_ltv {
        if ltv > cap {
            return Err(PricingError::gap(
                "dscr_bands",
                format!("DSCR {dscr} at LTV {ltv} (band {} requires LTV <= {cap})", entry.band),
            ));
        }
    }

    let adjustment = entry.adjustment.ok_or_else(|| PricingError::UndefinedBand {
        table: "dscr_bands".into(),
        band: entry.band.to_string(),
        value: dscr,
    })?;

    Ok(DscrResolution {
        adjustment,
        band: entry.band.clone(),
        provisional: entry.provisional,
    })
}

fn point_lookup(entries: &[PointAdjustment], points: Decimal, table: &str) -> PricingResult<Percent> {
    entries
        .iter()
        .find(|e| e.points == points)
        .map(|e| e.adjustment)
        .ok_or_else(|| PricingError::gap(table, format!("{points} points")))
}

/// Rate credit for broker compensation paid by the borrower.
pub fn origination_adjustment(sheet: &RateSheet, broker_comp: Percent) -> PricingResult<Percent> {
    point_lookup(&sheet.origination_adjustments, broker_comp, "origination_adjustments")
}

pub fn ysp_adjustment(sheet: &RateSheet, ysp: Percent) -> PricingResult<Percent> {
    point_lookup(&sheet.ysp_adjustments, ysp, "ysp_adjustments")
}

pub fn discount_points_adjustment(sheet: &RateSheet, points: Decimal) -> PricingResult<Percent> {
    point_lookup(&sheet.discount_point_adjustments, points, "discount_point_adjustments")
}

/// Loan-size band (rate adjustment and flat fee).
pub fn loan_size_band(sheet: &RateSheet, loan_amount: Money) -> PricingResult<&LoanSizeBand> {
    find_band(
        &sheet.loan_size_bands,
        |b| &b.band,
        loan_amount,
        &sheet.program_id,
        "loan_size_bands",
    )
    .map(|(_, b)| b)
}

/// Prepayment structure terms. Keys match exactly; an unknown key is a data
/// error, not an eligibility outcome.
pub fn prepay_terms<'a>(sheet: &'a RateSheet, structure: &str) -> PricingResult<&'a PrepayTerms> {
    sheet
        .prepay_structures
        .get(structure)
        .ok_or_else(|| PricingError::gap("prepay_structures", format!("\"{structure}\"")))
}

pub fn prepay_adjustment(sheet: &RateSheet, structure: &str) -> PricingResult<Percent> {
    prepay_terms(sheet, structure).map(|t| t.adjustment)
}

/// Program overrides: short-term rental surcharge plus the state override.
/// The state table is sparse; states without an entry carry no override.
pub fn program_adjustment(sheet: &RateSheet, state: &str, short_term_rental: bool) -> Percent {
    let program = &sheet.program_adjustments;
    let str_adj = if short_term_rental {
        program.short_term_rental
    } else {
        Decimal::ZERO
    };
    str_adj + program.states.get(state).copied().unwrap_or(Decimal::ZERO)
}

pub fn interest_only_adjustment(sheet: &RateSheet, interest_only: bool) -> Percent {
    if interest_only {
        sheet.program_adjustments.interest_only
    } else {
        Decimal::ZERO
    }
}
