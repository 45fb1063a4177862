use serde::{Deserialize, Serialize};
use std::fmt;

/// Loan products a DSCR program can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "30_Year_Fixed")]
    ThirtyYearFixed,
    #[serde(rename = "40_Year_Fixed")]
    FortyYearFixed,
    #[serde(rename = "7/6_ARM")]
    SevenSixArm,
    #[serde(rename = "5/6_ARM")]
    FiveSixArm,
}

impl Product {
    pub const ALL: [Product; 4] = [
        Product::ThirtyYearFixed,
        Product::FortyYearFixed,
        Product::SevenSixArm,
        Product::FiveSixArm,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Product::ThirtyYearFixed => "30_Year_Fixed",
            Product::FortyYearFixed => "40_Year_Fixed",
            Product::SevenSixArm => "7/6_ARM",
            Product::FiveSixArm => "5/6_ARM",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPurpose {
    Purchase,
    Refinance,
    CashOut,
}

impl fmt::Display for LoanPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanPurpose::Purchase => "purchase",
            LoanPurpose::Refinance => "refinance",
            LoanPurpose::CashOut => "cash_out",
        };
        f.write_str(s)
    }
}

/// Collateral types. `MultiFamily` (5+ units) and `MixedUse` are recognised
/// but only priced when a rate sheet maps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    SingleFamily,
    Townhome,
    Condo,
    TwoToFourUnit,
    MultiFamily,
    MixedUse,
}

impl PropertyType {
    /// Unit count range a property of this type may declare.
    pub fn unit_range(&self) -> (u32, u32) {
        match self {
            PropertyType::SingleFamily | PropertyType::Townhome | PropertyType::Condo => (1, 1),
            PropertyType::TwoToFourUnit => (2, 4),
            PropertyType::MultiFamily => (5, u32::MAX),
            PropertyType::MixedUse => (1, u32::MAX),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertyType::SingleFamily => "single_family",
            PropertyType::Townhome => "townhome",
            PropertyType::Condo => "condo",
            PropertyType::TwoToFourUnit => "two_to_four_unit",
            PropertyType::MultiFamily => "multi_family",
            PropertyType::MixedUse => "mixed_use",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyType {
    Investment,
    OwnerOccupied,
    SecondHome,
}

impl fmt::Display for OccupancyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OccupancyType::Investment => "investment",
            OccupancyType::OwnerOccupied => "owner_occupied",
            OccupancyType::SecondHome => "second_home",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_wire_names() {
        let json = serde_json::to_string(&Product::ThirtyYearFixed).unwrap();
        assert_eq!(json, "\"30_Year_Fixed\"");
        let p: Product = serde_json::from_str("\"7/6_ARM\"").unwrap();
        assert_eq!(p, Product::SevenSixArm);
    }

    #[test]
    fn test_display_matches_serde() {
        for product in Product::ALL {
            let json = serde_json::to_string(&product).unwrap();
            assert_eq!(json, format!("\"{product}\""));
        }
        let json = serde_json::to_string(&LoanPurpose::CashOut).unwrap();
        assert_eq!(json, format!("\"{}\"", LoanPurpose::CashOut));
    }

    #[test]
    fn test_unit_ranges() {
        assert_eq!(PropertyType::TwoToFourUnit.unit_range(), (2, 4));
        assert_eq!(PropertyType::Condo.unit_range(), (1, 1));
    }
}
