//! Split methods.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Policy governing how the total of an expense is divided among its
/// participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// Everybody owes the same amount; only participant ids are supplied.
    Equal,
    /// Every participant supplies a percentage, percentages add up to 100.
    Percentage,
    /// Every participant supplies an amount, amounts add up to the total.
    Exact,
}

impl SplitMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Percentage => "percentage",
            Self::Exact => "exact",
        }
    }
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SplitMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "equal" => Ok(Self::Equal),
            "percentage" => Ok(Self::Percentage),
            "exact" => Ok(Self::Exact),
            _ => Err(EngineError::UnsupportedSplitMethod(value.to_string())),
        }
    }
}

impl FromStr for SplitMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("equal".parse::<SplitMethod>().unwrap(), SplitMethod::Equal);
        assert_eq!(
            " Percentage ".parse::<SplitMethod>().unwrap(),
            SplitMethod::Percentage
        );
        assert_eq!("EXACT".parse::<SplitMethod>().unwrap(), SplitMethod::Exact);
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert_eq!(
            "shares".parse::<SplitMethod>(),
            Err(EngineError::UnsupportedSplitMethod("shares".to_string()))
        );
    }

    #[test]
    fn round_trips_through_as_str() {
        for method in [SplitMethod::Equal, SplitMethod::Percentage, SplitMethod::Exact] {
            assert_eq!(SplitMethod::try_from(method.as_str()).unwrap(), method);
        }
    }
}
