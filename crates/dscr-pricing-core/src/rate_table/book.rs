use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::sheet::RateSheet;
use super::standard::standard_dscr_sheet;
use crate::error::PricingError;
use crate::PricingResult;

/// Rate sheets keyed by program id. Immutable once built.
#[derive(Debug, Clone)]
pub struct RateBook {
    sheets: BTreeMap<String, RateSheet>,
    default_program: String,
    warnings: Vec<String>,
}

static STANDARD_BOOK: OnceLock<RateBook> = OnceLock::new();

impl RateBook {
    /// Build a book from sheets, validating each one. The first sheet is the
    /// default program.
    pub fn from_sheets(sheets: Vec<RateSheet>) -> PricingResult<Self> {
        let default_program = sheets
            .first()
            .map(|s| s.program_id.clone())
            .ok_or_else(|| PricingError::InvalidRateSheet {
                program: String::new(),
                reason: "a rate book needs at least one sheet".into(),
            })?;

        let mut warnings = Vec::new();
        let mut map = BTreeMap::new();
        for sheet in sheets {
            for w in sheet.validate()? {
                warnings.push(format!("{}: {w}", sheet.program_id));
            }
            if map.contains_key(&sheet.program_id) {
                return Err(PricingError::InvalidRateSheet {
                    program: sheet.program_id.clone(),
                    reason: "program id appears more than once".into(),
                });
            }
            map.insert(sheet.program_id.clone(), sheet);
        }

        tracing::debug!(programs = map.len(), warnings = warnings.len(), "rate book loaded");

        Ok(RateBook {
            sheets: map,
            default_program,
            warnings,
        })
    }

    /// The built-in book, constructed once per process.
    pub fn standard() -> &'static RateBook {
        STANDARD_BOOK.get_or_init(|| RateBook::builtin(standard_dscr_sheet()))
    }

    /// A single-program book that never prices against a sheet failing
    /// validation: the program is left out, so every request resolves to
    /// "program not offered".
    fn builtin(sheet: RateSheet) -> RateBook {
        let program = sheet.program_id.clone();
        let (sheets, warnings) = match sheet.validate() {
            Ok(warnings) => (
                BTreeMap::from([(program.clone(), sheet)]),
                warnings.into_iter().map(|w| format!("{program}: {w}")).collect(),
            ),
            Err(e) => {
                tracing::error!(program = %program, error = %e, "built-in rate sheet is invalid");
                (BTreeMap::new(), vec![format!("{program}: {e}")])
            }
        };
        RateBook {
            sheets,
            default_program: program,
            warnings,
        }
    }

    pub fn get(&self, program: &str) -> Option<&RateSheet> {
        self.sheets.get(program)
    }

    pub fn default_program(&self) -> &str {
        &self.default_program
    }

    /// The sheet for `program`, or the default program's sheet when `None`.
    pub fn resolve(&self, program: Option<&str>) -> Option<&RateSheet> {
        self.get(program.unwrap_or(&self.default_program))
    }

    pub fn programs(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// Validation warnings gathered when the book was built.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
