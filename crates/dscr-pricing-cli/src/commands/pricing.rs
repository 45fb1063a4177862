use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dscr_pricing_core::loan::OccupancyType;
use dscr_pricing_core::pricing::{self, PricingInput, PricingRequest};
use dscr_pricing_core::request::form::{
    parse_fico, parse_loan_purpose, parse_occupancy, parse_product, parse_property_type, prepay_key,
};

use super::Context;
use crate::input;

/// Arguments for pricing a loan
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PriceArgs {
    /// Path to a JSON/YAML pricing request or input (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Program id (defaults to DSCR_PRICING_PROGRAM, then the book default)
    #[arg(long)]
    pub program: Option<String>,

    /// Credit score or bucket ("745", "740-759", "780+")
    #[arg(long)]
    pub fico: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Estimated property value (LTV is derived from it)
    #[arg(long, alias = "value")]
    pub home_value: Option<Decimal>,

    /// LTV in percent, used when no property value is given
    #[arg(long)]
    pub ltv: Option<Decimal>,

    /// Loan purpose: purchase, refinance, cash-out
    #[arg(long, default_value = "purchase")]
    pub purpose: String,

    /// Property type, e.g. "single family", "condo", "2-4 unit"
    #[arg(long, default_value = "single family")]
    pub property_type: String,

    /// Two-letter property state
    #[arg(long)]
    pub state: Option<String>,

    /// Occupancy (defaults to investment)
    #[arg(long)]
    pub occupancy: Option<String>,

    /// Price only this product, e.g. "30_Year_Fixed"
    #[arg(long)]
    pub product: Option<String>,

    /// Interest-only payments
    #[arg(long)]
    pub interest_only: bool,

    /// Prepayment structure key, e.g. "5/4/3/2/1" or "None"
    #[arg(long, alias = "prepay")]
    pub prepay_structure: Option<String>,

    /// Debt service coverage ratio
    #[arg(long)]
    pub dscr: Option<Decimal>,

    /// Broker compensation in points
    #[arg(long, default_value = "0")]
    pub broker_comp: Decimal,

    /// Yield spread premium in points
    #[arg(long, default_value = "0")]
    pub ysp: Decimal,

    /// Discount points (quarter-point steps)
    #[arg(long, default_value = "0")]
    pub discount_points: Decimal,

    /// Broker admin fee
    #[arg(long, default_value = "0")]
    pub admin_fee: Decimal,

    /// Short-term rental
    #[arg(long = "str")]
    pub short_term_rental: bool,

    /// Unit count (defaults to the property type's minimum)
    #[arg(long)]
    pub units: Option<u32>,
}

pub fn run_price(args: PriceArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = match input::read_input::<Value>(args.input.as_deref())? {
        Some(value) => request_from_value(value)?,
        None => request_from_flags(&args)?,
    };

    if args.program.is_some() {
        request.program = args.program.clone();
    }
    if request.program.is_none() {
        request.program = ctx.program.clone();
    }

    let result = pricing::price_loan(&request, ctx.book)?;
    Ok(serde_json::to_value(result)?)
}

/// Accept either a full request (`{"program", "input"}`) or a bare input.
fn request_from_value(value: Value) -> Result<PricingRequest, Box<dyn std::error::Error>> {
    if value.get("input").is_some() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(PricingRequest {
            program: None,
            input: serde_json::from_value(value)?,
        })
    }
}

fn request_from_flags(args: &PriceArgs) -> Result<PricingRequest, Box<dyn std::error::Error>> {
    let property_type = parse_property_type(&args.property_type)?;
    let occupancy_type = match &args.occupancy {
        Some(label) => parse_occupancy(label)?,
        None => OccupancyType::Investment,
    };
    let product = args.product.as_deref().map(parse_product).transpose()?;

    let input = PricingInput {
        fico: parse_fico(
            args.fico
                .as_deref()
                .ok_or("--fico is required (or provide --input)")?,
        )?,
        ltv: args.ltv,
        loan_amount: args
            .loan_amount
            .ok_or("--loan-amount is required (or provide --input)")?,
        loan_purpose: parse_loan_purpose(&args.purpose)?,
        property_type,
        property_state: args
            .state
            .clone()
            .ok_or("--state is required (or provide --input)")?
            .to_ascii_uppercase(),
        occupancy_type,
        product,
        interest_only: args.interest_only,
        prepay_structure: prepay_key(
            args.prepay_structure
                .as_deref()
                .ok_or("--prepay-structure is required (or provide --input)")?,
        ),
        dscr: args.dscr.ok_or("--dscr is required (or provide --input)")?,
        broker_comp: args.broker_comp,
        ysp: args.ysp,
        discount_points: args.discount_points,
        broker_admin_fee: args.admin_fee,
        estimated_home_value: args.home_value,
        monthly_rental_income: Decimal::ZERO,
        annual_property_insurance: Decimal::ZERO,
        annual_property_taxes: Decimal::ZERO,
        monthly_hoa_fee: Decimal::ZERO,
        is_short_term_rental: args.short_term_rental,
        units: args.units.unwrap_or(property_type.unit_range().0),
    };

    Ok(PricingRequest {
        program: None,
        input,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_bare_input_and_full_request_accepted() {
        let bare = json!({
            "fico": 745,
            "loan_amount": "160000",
            "estimated_home_value": "200000",
            "loan_purpose": "purchase",
            "property_type": "single_family",
            "property_state": "TX",
            "prepay_structure": "None",
            "dscr": "1.3"
        });
        let req = request_from_value(bare.clone()).unwrap();
        assert!(req.program.is_none());
        assert_eq!(req.input.loan_amount, dec!(160000));

        let full = json!({ "program": "dscr-standard", "input": bare });
        let req = request_from_value(full).unwrap();
        assert_eq!(req.program.as_deref(), Some("dscr-standard"));
    }
}
