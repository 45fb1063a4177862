pub mod form;
pub mod quote;

pub use form::LoanApplicationForm;
pub use quote::{quote_application, Quote};
