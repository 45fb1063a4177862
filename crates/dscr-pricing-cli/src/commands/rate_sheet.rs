use clap::{Args, Subcommand};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

use dscr_pricing_core::rate_table::{RateBook, RateSheet};

use super::Context;
use crate::input::file;

/// Arguments for inspecting and validating rate sheets
#[derive(Args)]
pub struct RateSheetArgs {
    #[command(subcommand)]
    pub action: RateSheetAction,
}

#[derive(Subcommand)]
pub enum RateSheetAction {
    /// List the programs in the active rate book
    List,
    /// Print one program's rate sheet
    Show {
        /// Program id (defaults to the book's default program)
        #[arg(long)]
        program: Option<String>,
    },
    /// Validate a rate sheet file (a single sheet or an array of sheets)
    Validate {
        /// Path to the JSON or YAML rate sheet
        file: String,
    },
}

/// A rate sheet file holds either one sheet or several.
#[derive(Deserialize)]
#[serde(untagged)]
enum SheetDocument {
    Many(Vec<RateSheet>),
    One(Box<RateSheet>),
}

impl SheetDocument {
    fn into_sheets(self) -> Vec<RateSheet> {
        match self {
            SheetDocument::Many(sheets) => sheets,
            SheetDocument::One(sheet) => vec![*sheet],
        }
    }
}

/// Load and validate a rate book from a JSON or YAML file.
pub fn load_book(path: &Path) -> Result<RateBook, Box<dyn std::error::Error>> {
    let path = path.to_str().ok_or("rate sheet path is not valid UTF-8")?;
    let document: SheetDocument = file::read_document(path)?;
    let book = RateBook::from_sheets(document.into_sheets())?;
    for warning in book.warnings() {
        tracing::warn!(%warning, "rate sheet");
    }
    Ok(book)
}

pub fn run_rate_sheet(args: RateSheetArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    match args.action {
        RateSheetAction::List => {
            let programs: Vec<Value> = ctx
                .book
                .programs()
                .filter_map(|id| ctx.book.get(id))
                .map(|sheet| {
                    json!({
                        "program_id": sheet.program_id,
                        "lender_name": sheet.lender_name,
                        "version": sheet.version,
                        "effective_date": sheet.effective_date,
                        "products": sheet.offered_products().collect::<Vec<_>>(),
                        "provisional": sheet.is_provisional(),
                    })
                })
                .collect();
            Ok(json!({
                "default_program": ctx.book.default_program(),
                "programs": programs,
                "warnings": ctx.book.warnings(),
            }))
        }
        RateSheetAction::Show { program } => {
            let program = program.or_else(|| ctx.program.clone());
            let sheet = ctx.book.resolve(program.as_deref()).ok_or_else(|| {
                format!(
                    "program '{}' is not in the rate book",
                    program.as_deref().unwrap_or(ctx.book.default_program())
                )
            })?;
            Ok(serde_json::to_value(sheet)?)
        }
        RateSheetAction::Validate { file } => {
            let book = load_book(Path::new(&file))?;
            Ok(json!({
                "valid": true,
                "programs": book.programs().collect::<Vec<_>>(),
                "warnings": book.warnings(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::file::{parse_document, DocumentFormat};
    use dscr_pricing_core::rate_table::standard_dscr_sheet;

    #[test]
    fn test_single_sheet_and_array_documents() {
        let sheet = standard_dscr_sheet();
        let one = serde_json::to_string(&sheet).unwrap();
        let many = serde_json::to_string(&vec![sheet.clone(), sheet]).unwrap();

        let doc: SheetDocument = parse_document(&one, DocumentFormat::Json).unwrap();
        assert_eq!(doc.into_sheets().len(), 1);
        let doc: SheetDocument = parse_document(&many, DocumentFormat::Json).unwrap();
        assert_eq!(doc.into_sheets().len(), 2);
    }

    #[test]
    fn test_duplicate_programs_rejected() {
        let sheet = standard_dscr_sheet();
        let doc = SheetDocument::Many(vec![sheet.clone(), sheet]);
        assert!(RateBook::from_sheets(doc.into_sheets()).is_err());
    }
}
