pub mod adjustments;
pub mod amortization;
pub mod error;
pub mod loan;
pub mod pricing;
pub mod rate_table;
pub mod rpc;
pub mod types;

#[cfg(feature = "analytics")]
pub mod analytics;

#[cfg(feature = "request")]
pub mod request;

pub use error::PricingError;
pub use types::*;

/// Standard result type for all pricing operations
pub type PricingResult<T> = Result<T, PricingError>;
