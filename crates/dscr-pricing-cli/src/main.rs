mod commands;
mod config;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use dscr_pricing_core::rate_table::RateBook;

use commands::analytics::AnalyzeArgs;
use commands::application::ApplicationArgs;
use commands::pricing::PriceArgs;
use commands::rate_sheet::RateSheetArgs;
use commands::Context;
use config::{CliConfig, Overrides};

/// DSCR loan pricing from lender rate sheets
#[derive(Parser)]
#[command(
    name = "dscr-pricer",
    version,
    about = "DSCR investment-property loan pricing",
    long_about = "Prices debt-service-coverage-ratio loans against versioned lender rate \
                  sheets with decimal precision. Produces eligible loan options with an \
                  itemized rate and fee breakdown, and DSCR cash-flow analytics."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Rate sheet file (JSON or YAML) replacing the built-in book
    #[arg(long, global = true)]
    rate_sheet: Option<String>,

    /// Log filter, e.g. "info" or "dscr_pricing_core=debug"
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a loan and list every eligible product
    Price(PriceArgs),
    /// DSCR cash-flow analytics for a financed option
    Analyze(AnalyzeArgs),
    /// Normalize, price and analyze a loan application form
    Quote(ApplicationArgs),
    /// Convert a loan application form into a pricing request
    Normalize(ApplicationArgs),
    /// Inspect or validate rate sheets
    RateSheet(RateSheetArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("dscr-pricer {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let config = match CliConfig::load(Overrides {
        rate_sheet: cli.rate_sheet.clone(),
        log_level: cli.log_level.clone(),
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    if let Err(e) = telemetry::init(&config.telemetry) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    match run(cli.command, &config) {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn run(
    command: Commands,
    config: &CliConfig,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let loaded;
    let book: &RateBook = match &config.rate_sheet {
        Some(path) => {
            loaded = commands::rate_sheet::load_book(path)?;
            &loaded
        }
        None => RateBook::standard(),
    };

    let ctx = Context {
        book,
        program: config.program.clone(),
    };

    match command {
        Commands::Price(args) => commands::pricing::run_price(args, &ctx),
        Commands::Analyze(args) => commands::analytics::run_analyze(args),
        Commands::Quote(args) => commands::application::run_quote(args, &ctx),
        Commands::Normalize(args) => commands::application::run_normalize(args),
        Commands::RateSheet(args) => commands::rate_sheet::run_rate_sheet(args, &ctx),
        Commands::Version => Ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
    }
}
