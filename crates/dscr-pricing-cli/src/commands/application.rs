use clap::Args;
use serde_json::Value;

use dscr_pricing_core::request::{self, LoanApplicationForm};

use super::Context;
use crate::input;

/// Arguments for commands that read a portal loan application form
#[derive(Args)]
pub struct ApplicationArgs {
    /// Path to the camelCase application form (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,
}

fn read_form(args: &ApplicationArgs) -> Result<LoanApplicationForm, Box<dyn std::error::Error>> {
    input::read_input(args.input.as_deref())?
        .ok_or_else(|| "--input file (or piped stdin) is required for an application form".into())
}

/// Normalize a form into the engine's pricing request.
pub fn run_normalize(args: ApplicationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let form = read_form(&args)?;
    let request = form.normalize()?;
    Ok(serde_json::to_value(request)?)
}

/// Normalize, price and (when cash invested is supplied) analyze a form.
pub fn run_quote(args: ApplicationArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let mut form = read_form(&args)?;
    if form.program.is_none() {
        form.program = ctx.program.clone();
    }
    let result = request::quote_application(&form, ctx.book)?;
    Ok(serde_json::to_value(result)?)
}
