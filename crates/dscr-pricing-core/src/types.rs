use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::PricingResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates and rate adjustments in percentage points (6.825 = 6.825%).
pub type Percent = Decimal;

/// Dimensionless ratios (DSCR 1.25x, break-even 0.42).
pub type Multiple = Decimal;

/// Ceiling on any single monetary input (loan amount, rent, property value).
pub const MAX_AMOUNT: Money = dec!(1000000000000);

/// A ratio that may be undefined because its denominator was zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Ratio {
    Defined { value: Decimal },
    Undefined { reason: String },
}

impl Ratio {
    /// `numerator / denominator`, or `Undefined` naming `context` when the
    /// denominator is zero or the quotient is out of range.
    pub fn checked(numerator: Decimal, denominator: Decimal, context: &str) -> Self {
        if denominator.is_zero() {
            return Ratio::Undefined {
                reason: format!("{context}: denominator is zero"),
            };
        }
        match numerator.checked_div(denominator) {
            Some(value) => Ratio::Defined { value },
            None => Ratio::Undefined {
                reason: format!("{context}: quotient out of range"),
            },
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Ratio::Defined { value } => Some(*value),
            Ratio::Undefined { .. } => None,
        }
    }

    /// The defined value, or a `DivisionByZero` error for callers that cannot
    /// proceed without it.
    pub fn require(&self, context: &str) -> PricingResult<Decimal> {
        self.value().ok_or_else(|| PricingError::DivisionByZero {
            context: context.to_string(),
        })
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Ratio::Defined { .. })
    }

    pub(crate) fn scaled(self, factor: Decimal) -> Self {
        match self {
            Ratio::Defined { value } => match value.checked_mul(factor) {
                Some(value) => Ratio::Defined { value },
                None => Ratio::Undefined {
                    reason: format!("{value} × {factor} is out of range"),
                },
            },
            undefined => undefined,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ratio_defined() {
        let r = Ratio::checked(dec!(48000), dec!(12000), "dscr");
        assert_eq!(r.value(), Some(dec!(4)));
        assert!(r.is_defined());
    }

    #[test]
    fn test_ratio_zero_denominator_is_undefined() {
        let r = Ratio::checked(dec!(48000), Decimal::ZERO, "dscr");
        assert!(!r.is_defined());
        assert!(matches!(
            r.require("dscr"),
            Err(PricingError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_ratio_serializes_tagged() {
        let r = Ratio::Undefined {
            reason: "cap rate: denominator is zero".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "undefined");
    }

    #[test]
    fn test_out_of_range_quotient_is_undefined() {
        let r = Ratio::checked(Decimal::MAX, dec!(0.0001), "dscr");
        assert!(!r.is_defined());
        let r = Ratio::checked(Decimal::MAX, Decimal::ONE, "x").scaled(dec!(100));
        assert!(!r.is_defined());
    }

    #[test]
    fn test_scaled_keeps_undefined() {
        let r = Ratio::checked(dec!(1), Decimal::ZERO, "x").scaled(dec!(100));
        assert!(!r.is_defined());
        let d = Ratio::checked(dec!(1), dec!(4), "x").scaled(dec!(100));
        assert_eq!(d.value(), Some(dec!(25)));
    }
}
