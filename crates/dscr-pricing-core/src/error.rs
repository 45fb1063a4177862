use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Rate table gap: no {table} entry for {value}")]
    DataGap { table: String, value: String },

    #[error("Undefined band: {table} band {band} has no configured adjustment (value {value})")]
    UndefinedBand {
        table: String,
        band: String,
        value: Decimal,
    },

    #[error("Invalid rate sheet '{program}': {reason}")]
    InvalidRateSheet { program: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse classification used by the RPC envelope and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    DataGap,
    Computation,
    Configuration,
    Serialization,
}

impl PricingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PricingError::InvalidInput { .. } => ErrorKind::Validation,
            PricingError::DataGap { .. } | PricingError::UndefinedBand { .. } => {
                ErrorKind::DataGap
            }
            PricingError::InvalidRateSheet { .. } => ErrorKind::Configuration,
            PricingError::DivisionByZero { .. } | PricingError::Overflow { .. } => {
                ErrorKind::Computation
            }
            PricingError::SerializationError(_) => ErrorKind::Serialization,
        }
    }

    /// The offending input field, when the error names one.
    pub fn field(&self) -> Option<&str> {
        match self {
            PricingError::InvalidInput { field, .. } => Some(field),
            _ => None,
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        PricingError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(context: &str) -> Self {
        PricingError::Overflow {
            context: context.into(),
        }
    }

    pub(crate) fn gap(table: &str, value: impl std::fmt::Display) -> Self {
        PricingError::DataGap {
            table: table.into(),
            value: value.to_string(),
        }
    }
}

/// Well-formed JSON with a missing or mistyped field is invalid input; only
/// unparseable documents are serialization errors.
impl From<serde_json::Error> for PricingError {
    fn from(e: serde_json::Error) -> Self {
        let message = e.to_string();
        match e.classify() {
            Category::Data => PricingError::InvalidInput {
                field: field_named_in(&message).unwrap_or("request").to_string(),
                reason: message,
            },
            Category::Io | Category::Syntax | Category::Eof => {
                PricingError::SerializationError(message)
            }
        }
    }
}

/// Field quoted in serde's "missing field `x`" and "unknown field `x`" messages.
fn field_named_in(message: &str) -> Option<&str> {
    ["missing field `", "unknown field `"].iter().find_map(|prefix| {
        let start = message.find(prefix)? + prefix.len();
        message[start..].split('`').next()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            PricingError::invalid("fico", "out of range").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            PricingError::gap("prepay_structures", "7/7/7").kind(),
            ErrorKind::DataGap
        );
        let band = PricingError::UndefinedBand {
            table: "dscr_bands".into(),
            band: "[1.00, 1.20]".into(),
            value: dec!(1.1),
        };
        assert_eq!(band.kind(), ErrorKind::DataGap);
    }

    #[test]
    fn test_data_gap_names_value() {
        let err = PricingError::gap("prepay_structures", "7/7/7");
        assert_eq!(
            err.to_string(),
            "Rate table gap: no prepay_structures entry for 7/7/7"
        );
    }

    #[test]
    fn test_missing_field_is_validation() {
        let e = serde_json::from_str::<crate::pricing::PricingInput>(r#"{"fico": 745}"#).unwrap_err();
        let err = PricingError::from(e);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field(), Some("loan_amount"));
    }

    #[test]
    fn test_malformed_value_is_validation() {
        let e = serde_json::from_str::<Decimal>(r#""abc""#).unwrap_err();
        let err = PricingError::from(e);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_unparseable_json_is_serialization() {
        let e = serde_json::from_str::<Decimal>("{oops").unwrap_err();
        assert_eq!(PricingError::from(e).kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_overflow_is_computation() {
        assert_eq!(
            PricingError::overflow("monthly payment").kind(),
            ErrorKind::Computation
        );
    }

    #[test]
    fn test_field_only_for_validation() {
        assert_eq!(PricingError::invalid("ysp", "negative").field(), Some("ysp"));
        assert_eq!(
            PricingError::DivisionByZero {
                context: "dscr".into()
            }
            .field(),
            None
        );
    }
}
