use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::PricingError;
use crate::types::{Money, Percent};
use crate::PricingResult;

const MONTHS_PER_YEAR: u32 = 12;

/// Longest amortization term accepted anywhere in pricing or analytics.
pub const MAX_TERM_YEARS: u32 = 50;

/// Highest note rate, in percentage points, a payment is computed for.
pub const MAX_NOTE_RATE: Percent = dec!(100);

/// Monthly payment for a loan quoted at `annual_rate` percentage points.
///
/// Interest-only loans pay `principal × rate / 12` with no principal
/// component; amortizing loans use the level-payment formula over
/// `term_years × 12` months.
pub fn monthly_payment(
    principal: Money,
    annual_rate: Percent,
    term_years: u32,
    interest_only: bool,
) -> PricingResult<Money> {
    if principal < Decimal::ZERO {
        return Err(PricingError::invalid(
            "loan_amount",
            "Principal must be non-negative",
        ));
    }
    if annual_rate < Decimal::ZERO || annual_rate > MAX_NOTE_RATE {
        return Err(PricingError::invalid(
            "final_rate",
            format!("Note rate must be between 0 and {MAX_NOTE_RATE}"),
        ));
    }
    if term_years > MAX_TERM_YEARS {
        return Err(PricingError::invalid(
            "term_years",
            format!("Term cannot exceed {MAX_TERM_YEARS} years"),
        ));
    }

    let monthly_rate = annual_rate / dec!(100) / Decimal::from(MONTHS_PER_YEAR);

    if interest_only {
        return principal
            .checked_mul(monthly_rate)
            .ok_or_else(|| PricingError::overflow("interest-only payment"));
    }

    let total_months = term_years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| PricingError::overflow("term in months"))?;
    amortizing_payment(principal, monthly_rate, total_months)
}

/// Level payment: P * r(1+r)^n / ((1+r)^n - 1)
pub fn amortizing_payment(
    principal: Money,
    monthly_rate: Decimal,
    total_months: u32,
) -> PricingResult<Money> {
    if total_months == 0 {
        return Err(PricingError::DivisionByZero {
            context: "monthly payment over zero months".into(),
        });
    }

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(total_months));
    }

    let overflow = || PricingError::overflow("mortgage payment");

    // (1 + r)^n via iterative multiplication
    let growth = Decimal::ONE.checked_add(monthly_rate).ok_or_else(overflow)?;
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        compound = compound.checked_mul(growth).ok_or_else(overflow)?;
    }

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(PricingError::DivisionByZero {
            context: "mortgage payment denominator".into(),
        });
    }

    // r(1+r)^n / ((1+r)^n - 1) stays near r, so scale the principal last
    monthly_rate
        .checked_mul(compound)
        .and_then(|f| f.checked_div(denominator))
        .and_then(|f| principal.checked_mul(f))
        .ok_or_else(overflow)
}

/// Twelve monthly payments.
pub fn annual_debt_service(monthly_payment: Money) -> PricingResult<Money> {
    monthly_payment
        .checked_mul(Decimal::from(MONTHS_PER_YEAR))
        .ok_or_else(|| PricingError::overflow("annual debt service"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAX_AMOUNT;

    #[test]
    fn test_thirty_year_payment() {
        // 160,000 at 7.4% over 360 months ≈ 1,107.80
        let pmt = monthly_payment(dec!(160000), dec!(7.4), 30, false).unwrap();
        assert!((pmt - dec!(1107.80)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_interest_only_payment() {
        // 160,000 × 7.4% / 12 = 986.666...
        let pmt = monthly_payment(dec!(160000), dec!(7.4), 30, true).unwrap();
        assert!((pmt - dec!(986.6666666667)).abs() < dec!(0.0000001), "got {pmt}");
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let pmt = monthly_payment(dec!(120000), Decimal::ZERO, 10, false).unwrap();
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_zero_term_errors() {
        let err = monthly_payment(dec!(100000), dec!(7), 0, false).unwrap_err();
        assert!(matches!(err, PricingError::DivisionByZero { .. }));
    }

    #[test]
    fn test_interest_only_ignores_term() {
        let a = monthly_payment(dec!(100000), dec!(6), 30, true).unwrap();
        let b = monthly_payment(dec!(100000), dec!(6), 40, true).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, dec!(500));
    }

    #[test]
    fn test_annual_debt_service() {
        assert_eq!(annual_debt_service(dec!(1000.50)).unwrap(), dec!(12006.00));
    }

    #[test]
    fn test_rate_and_term_bounds() {
        let err = monthly_payment(dec!(160000), dec!(300), 30, false).unwrap_err();
        assert_eq!(err.field(), Some("final_rate"));
        let err = monthly_payment(dec!(160000), dec!(7.4), 1000, false).unwrap_err();
        assert_eq!(err.field(), Some("term_years"));
        let err = monthly_payment(dec!(160000), dec!(7.4), u32::MAX, true).unwrap_err();
        assert_eq!(err.field(), Some("term_years"));
    }

    #[test]
    fn test_extreme_bounded_inputs_do_not_panic() {
        // 100% over 50 years compounds to roughly 1e21
        let pmt = monthly_payment(dec!(1000000), MAX_NOTE_RATE, MAX_TERM_YEARS, false).unwrap();
        assert!(pmt > dec!(83333) && pmt < dec!(83334), "got {pmt}");

        let pmt = monthly_payment(MAX_AMOUNT, MAX_NOTE_RATE, MAX_TERM_YEARS, false).unwrap();
        assert!(pmt > dec!(83333333333) && pmt < dec!(83333333334), "got {pmt}");

        let err = amortizing_payment(Decimal::MAX, dec!(2), 1).unwrap_err();
        assert!(matches!(err, PricingError::Overflow { .. }));
    }

    #[test]
    fn test_compound_overflow_is_error() {
        let err = amortizing_payment(dec!(100000), dec!(1), 1000).unwrap_err();
        assert!(matches!(err, PricingError::Overflow { .. }));
    }
}
