pub mod bands;
pub mod book;
pub mod sheet;
pub mod standard;

pub use bands::Band;
pub use book::RateBook;
pub use sheet::RateSheet;
pub use standard::{standard_dscr_sheet, STANDARD_PROGRAM_ID};
