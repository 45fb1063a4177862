pub mod dscr;

pub use dscr::{analyze_dscr, DscrAnalyticsInput, DscrMetrics, FinancedLoan};
