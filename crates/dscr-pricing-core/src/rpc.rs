//! String-in/string-out entry points for host runtimes.
//!
//! Every function returns `{"success": true, "data": ...}` or
//! `{"success": false, "error": {"kind", "message", "field"?}}` and never
//! panics or returns an error across the boundary.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ErrorKind, PricingError};
use crate::rate_table::book::RateBook;
use crate::PricingResult;

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

#[derive(Debug, Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

const FALLBACK_ERROR: &str = r#"{"success":false,"error":{"kind":"serialization","message":"response could not be serialized"}}"#;

fn respond<T: Serialize>(result: PricingResult<T>) -> String {
    let envelope = match result {
        Ok(data) => Envelope {
            success: true,
            data: Some(data),
            error: None,
        },
        Err(e) => {
            tracing::debug!(error = %e, "rpc call failed");
            Envelope {
                success: false,
                data: None,
                error: Some(ErrorBody {
                    kind: e.kind(),
                    message: e.to_string(),
                    field: e.field().map(str::to_string),
                }),
            }
        }
    };
    serde_json::to_string(&envelope).unwrap_or_else(|_| FALLBACK_ERROR.to_string())
}

fn parse<T: DeserializeOwned>(json: &str) -> PricingResult<T> {
    serde_json::from_str(json).map_err(PricingError::from)
}

/// Price a `PricingRequest` against the standard rate book.
pub fn price_json(request_json: &str) -> String {
    price_json_with(RateBook::standard(), request_json)
}

pub fn price_json_with(book: &RateBook, request_json: &str) -> String {
    respond(parse(request_json).and_then(|req| crate::pricing::price_loan(&req, book)))
}

/// Price a `PricingInput` against a caller-supplied rate sheet.
pub fn price_with_sheet_json(sheet_json: &str, input_json: &str) -> String {
    respond(parse::<crate::rate_table::RateSheet>(sheet_json).and_then(|sheet| {
        let input = parse(input_json)?;
        crate::pricing::price_with_sheet(&sheet, &input)
    }))
}

/// Validate a rate sheet, returning its warnings.
pub fn validate_rate_sheet_json(sheet_json: &str) -> String {
    respond(parse::<crate::rate_table::RateSheet>(sheet_json).and_then(|sheet| sheet.validate()))
}

#[cfg(feature = "analytics")]
pub fn analyze_json(input_json: &str) -> String {
    respond(parse(input_json).and_then(|input| crate::analytics::analyze_dscr(&input)))
}

#[cfg(feature = "request")]
pub fn normalize_json(form_json: &str) -> String {
    respond(
        parse::<crate::request::LoanApplicationForm>(form_json).and_then(|form| form.normalize()),
    )
}

#[cfg(feature = "request")]
pub fn quote_json(form_json: &str) -> String {
    quote_json_with(RateBook::standard(), form_json)
}

#[cfg(feature = "request")]
pub fn quote_json_with(book: &RateBook, form_json: &str) -> String {
    respond(
        parse::<crate::request::LoanApplicationForm>(form_json)
            .and_then(|form| crate::request::quote_application(&form, book)),
    )
}
