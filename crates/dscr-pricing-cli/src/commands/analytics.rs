use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dscr_pricing_core::analytics::{self, DscrAnalyticsInput, FinancedLoan};

use crate::input;

/// Arguments for DSCR cash-flow analytics
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnalyzeArgs {
    /// Path to JSON/YAML analytics input (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Note rate in percent (e.g. 7.4)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization term in years
    #[arg(long, default_value_t = 30)]
    pub term_years: u32,

    /// Interest-only payments
    #[arg(long)]
    pub interest_only: bool,

    /// Monthly rental income
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Annual property insurance
    #[arg(long, default_value = "0")]
    pub insurance: Decimal,

    /// Annual property taxes
    #[arg(long, default_value = "0")]
    pub taxes: Decimal,

    /// Monthly HOA dues
    #[arg(long, default_value = "0")]
    pub hoa: Decimal,

    /// Estimated property value
    #[arg(long, alias = "value")]
    pub home_value: Option<Decimal>,

    /// Down payment
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Closing costs
    #[arg(long, default_value = "0")]
    pub closing_costs: Decimal,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analytics_input: DscrAnalyticsInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => DscrAnalyticsInput {
            option: FinancedLoan {
                loan_amount: args
                    .loan_amount
                    .ok_or("--loan-amount is required (or provide --input)")?,
                final_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
                term_years: args.term_years,
                interest_only: args.interest_only,
                monthly_payment: None,
            },
            monthly_rental_income: args.rent.ok_or("--rent is required (or provide --input)")?,
            annual_property_insurance: args.insurance,
            annual_property_taxes: args.taxes,
            monthly_hoa_fee: args.hoa,
            estimated_home_value: args
                .home_value
                .ok_or("--home-value is required (or provide --input)")?,
            down_payment: args
                .down_payment
                .ok_or("--down-payment is required (or provide --input)")?,
            closing_costs: args.closing_costs,
        },
    };

    let result = analytics::analyze_dscr(&analytics_input)?;
    Ok(serde_json::to_value(result)?)
}
