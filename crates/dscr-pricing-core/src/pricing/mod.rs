pub mod eligibility;
pub mod engine;
pub mod fees;
pub mod input;

pub use eligibility::{EligibilityExclusion, ExclusionCode};
pub use engine::{
    price_loan, price_with_sheet, LoanOption, PricingOutput, PricingStatus, RateBreakdown,
};
pub use fees::FeeBreakdown;
pub use input::{PricingInput, PricingRequest};
