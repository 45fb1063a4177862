pub mod analytics;
pub mod application;
pub mod pricing;
pub mod rate_sheet;

use dscr_pricing_core::rate_table::RateBook;

/// Shared state every command runs against.
pub struct Context<'a> {
    pub book: &'a RateBook,
    /// Program used when a request names none
    pub program: Option<String>,
}
