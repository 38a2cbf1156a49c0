use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How many targets an actor must rank before a submission may leave the client.
///
/// Ranking screens have used both a fixed count and a share of the list; each screen picks
/// its own policy instead of sharing one rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "value", rename_all = "snake_case")]
pub enum CoveragePolicy {
    FixedCount(usize),
    FractionOfTotal(f64),
}

/// Relative slack for fractions such as 0.3 that are not exact in binary.
const FRACTION_TOLERANCE: f64 = 1e-9;

impl CoveragePolicy {
    /// Number of ranked targets required out of `total`; never more than `total`.
    pub fn required(&self, total: usize) -> usize {
        let wanted = match *self {
            CoveragePolicy::FixedCount(count) => count,
            CoveragePolicy::FractionOfTotal(fraction) => {
                let exact = fraction * total as f64;
                (exact - exact * FRACTION_TOLERANCE).ceil().max(0.0) as usize
            }
        };
        wanted.min(total)
    }

    pub fn describe(&self) -> String {
        match *self {
            CoveragePolicy::FixedCount(count) => format!("at least {count}"),
            CoveragePolicy::FractionOfTotal(fraction) => {
                format!("at least {:.0}%", fraction * 100.0)
            }
        }
    }
}

impl fmt::Display for CoveragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoveragePolicy::FixedCount(count) => write!(f, "fixed:{count}"),
            CoveragePolicy::FractionOfTotal(fraction) => write!(f, "fraction:{fraction}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyParseError {
    #[error("expected 'fixed:<count>' or 'fraction:<0..=1>', got '{0}'")]
    UnknownForm(String),
    #[error("invalid count '{0}'")]
    InvalidCount(String),
    #[error("fraction must be greater than 0 and at most 1, got '{0}'")]
    InvalidFraction(String),
}

impl FromStr for CoveragePolicy {
    type Err = PolicyParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let (kind, value) = trimmed
            .split_once(':')
            .ok_or_else(|| PolicyParseError::UnknownForm(trimmed.to_string()))?;
        let value = value.trim();

        match kind.trim().to_ascii_lowercase().as_str() {
            "fixed" => value
                .parse::<usize>()
                .map(CoveragePolicy::FixedCount)
                .map_err(|_| PolicyParseError::InvalidCount(value.to_string())),
            "fraction" => match value.parse::<f64>() {
                Ok(fraction) if fraction > 0.0 && fraction <= 1.0 => {
                    Ok(CoveragePolicy::FractionOfTotal(fraction))
                }
                _ => Err(PolicyParseError::InvalidFraction(value.to_string())),
            },
            _ => Err(PolicyParseError::UnknownForm(trimmed.to_string())),
        }
    }
}
