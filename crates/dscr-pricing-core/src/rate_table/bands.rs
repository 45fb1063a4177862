//! Numeric ranges used by every tiered table.
//!
//! A band states the inclusivity of both bounds explicitly so that boundary
//! values (LTV exactly 80, DSCR exactly 1.20) resolve to exactly one band.
//! Lookups never fall back to a default: no match is a [`PricingError::DataGap`]
//! and more than one match is a [`PricingError::InvalidRateSheet`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PricingError;
use crate::PricingResult;

fn default_true() -> bool {
    true
}

/// A numeric interval. `max: None` is unbounded above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub min: Decimal,
    #[serde(default = "default_true")]
    pub min_inclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    #[serde(default)]
    pub max_inclusive: bool,
}

impl Band {
    /// `[min, max)`
    pub fn half_open(min: Decimal, max: Decimal) -> Self {
        Band {
            min,
            min_inclusive: true,
            max: Some(max),
            max_inclusive: false,
        }
    }

    /// `(min, max]`
    pub fn upper_closed(min: Decimal, max: Decimal) -> Self {
        Band {
            min,
            min_inclusive: false,
            max: Some(max),
            max_inclusive: true,
        }
    }

    /// `[min, max]`
    pub fn closed(min: Decimal, max: Decimal) -> Self {
        Band {
            min,
            min_inclusive: true,
            max: Some(max),
            max_inclusive: true,
        }
    }

    /// `(min, ∞)`
    pub fn above(min: Decimal) -> Self {
        Band {
            min,
            min_inclusive: false,
            max: None,
            max_inclusive: false,
        }
    }

    /// `[min, ∞)`
    pub fn at_least(min: Decimal) -> Self {
        Band {
            min,
            min_inclusive: true,
            max: None,
            max_inclusive: false,
        }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        let above_min = if self.min_inclusive {
            value >= self.min
        } else {
            value > self.min
        };
        let below_max = match self.max {
            None => true,
            Some(max) if self.max_inclusive => value <= max,
            Some(max) => value < max,
        };
        above_min && below_max
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.min_inclusive { '[' } else { '(' };
        match self.max {
            Some(max) => {
                let close = if self.max_inclusive { ']' } else { ')' };
                write!(f, "{open}{}, {}{close}", self.min, max)
            }
            None => write!(f, "{open}{}, ∞)", self.min),
        }
    }
}

/// Find the single entry whose band contains `value`.
pub fn find_band<'a, T>(
    entries: &'a [T],
    band_of: impl Fn(&T) -> &Band,
    value: Decimal,
    program: &str,
    table: &str,
) -> PricingResult<(usize, &'a T)> {
    let mut matches = entries
        .iter()
        .enumerate()
        .filter(|&(_, e)| band_of(e).contains(value));

    let first = matches.next().ok_or_else(|| PricingError::gap(table, value))?;

    if let Some((_, second)) = matches.next() {
        return Err(PricingError::InvalidRateSheet {
            program: program.to_string(),
            reason: format!(
                "{table}: value {value} matches both {} and {}",
                band_of(first.1),
                band_of(second)
            ),
        });
    }

    Ok(first)
}

/// Domain a banded table must cover without gaps or overlaps.
#[derive(Debug, Clone)]
pub struct Coverage {
    pub table: &'static str,
    pub domain: Band,
}

impl Coverage {
    /// Verify that `bands`, in ascending order, tile `self.domain` exactly.
    pub fn check(&self, program: &str, bands: &[&Band]) -> PricingResult<()> {
        let fail = |reason: String| PricingError::InvalidRateSheet {
            program: program.to_string(),
            reason: format!("{}: {reason}", self.table),
        };

        let first = bands.first().ok_or_else(|| fail("table is empty".into()))?;
        let last = bands.last().ok_or_else(|| fail("table is empty".into()))?;

        for band in bands {
            if let Some(max) = band.max {
                if max <= band.min {
                    return Err(fail(format!("band {band} is empty")));
                }
            }
        }

        // Lower end of the domain
        let domain = &self.domain;
        if first.min > domain.min
            || (first.min == domain.min && domain.min_inclusive && !first.min_inclusive)
        {
            return Err(fail(format!(
                "first band {first} does not reach domain start {domain}"
            )));
        }

        // Adjacent bands must meet at one point claimed by exactly one side
        for pair in bands.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let a_max = a
                .max
                .ok_or_else(|| fail(format!("unbounded band {a} is not last")))?;
            if a_max != b.min {
                return Err(fail(format!("gap or overlap between {a} and {b}")));
            }
            match (a.max_inclusive, b.min_inclusive) {
                (true, true) => return Err(fail(format!("{a} and {b} both claim {a_max}"))),
                (false, false) => return Err(fail(format!("{a_max} falls between {a} and {b}"))),
                _ => {}
            }
        }

        // Upper end of the domain
        match (domain.max, last.max) {
            (_, None) => {}
            (None, Some(_)) => {
                return Err(fail(format!("last band {last} must be unbounded")));
            }
            (Some(dmax), Some(lmax)) => {
                if lmax < dmax || (lmax == dmax && domain.max_inclusive && !last.max_inclusive) {
                    return Err(fail(format!(
                        "last band {last} does not reach domain end {domain}"
                    )));
                }
            }
        }

        Ok(())
    }
}
