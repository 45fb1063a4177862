//! Node entry points for the loan portal. Pricing calls take and return JSON
//! strings in the `{"success", "data" | "error"}` envelope and never throw.

use napi::Result as NapiResult;
use napi_derive::napi;

use dscr_pricing_core::rate_table::RateBook;
use dscr_pricing_core::rpc;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

#[napi]
pub fn price_loan(request_json: String) -> String {
    rpc::price_json(&request_json)
}

#[napi]
pub fn price_loan_with_sheet(sheet_json: String, input_json: String) -> String {
    rpc::price_with_sheet_json(&sheet_json, &input_json)
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_dscr(input_json: String) -> String {
    rpc::analyze_json(&input_json)
}

// ---------------------------------------------------------------------------
// Application forms
// ---------------------------------------------------------------------------

#[napi]
pub fn normalize_application(form_json: String) -> String {
    rpc::normalize_json(&form_json)
}

#[napi]
pub fn quote_application(form_json: String) -> String {
    rpc::quote_json(&form_json)
}

// ---------------------------------------------------------------------------
// Rate sheets
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_rate_sheet(sheet_json: String) -> String {
    rpc::validate_rate_sheet_json(&sheet_json)
}

/// The built-in sheet for `program` (default program when omitted). Throws
/// when the program is not in the standard book.
#[napi]
pub fn standard_rate_sheet(program: Option<String>) -> NapiResult<String> {
    let book = RateBook::standard();
    let sheet = book
        .resolve(program.as_deref())
        .ok_or_else(|| to_napi_error(format!("unknown program '{}'", program.unwrap_or_default())))?;
    serde_json::to_string(sheet).map_err(to_napi_error)
}
