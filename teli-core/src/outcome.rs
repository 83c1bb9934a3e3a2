//! Verdicts produced when a user compares two items.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::ItemId;

/// A user's verdict on a (new item, existing item) pair.
///
/// # Examples
/// ```
/// use teli_core::ComparisonOutcome;
///
/// assert_eq!(ComparisonOutcome::PreferNew.score(), 1.0);
/// assert_eq!("equal".parse::<ComparisonOutcome>(), Ok(ComparisonOutcome::Equal));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ComparisonOutcome {
    /// The item being ranked is better.
    PreferNew,
    /// Both items are as good as each other.
    Equal,
    /// The item already in the collection is better.
    PreferExisting,
}

impl ComparisonOutcome {
    /// Actual score awarded to the new item: `1.0`, `0.5` or `0.0`.
    #[must_use]
    pub const fn score(self) -> f64 {
        match self {
            Self::PreferNew => 1.0,
            Self::Equal => 0.5,
            Self::PreferExisting => 0.0,
        }
    }

    /// Return the verdict as a kebab-case `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreferNew => "prefer-new",
            Self::Equal => "equal",
            Self::PreferExisting => "prefer-existing",
        }
    }
}

impl fmt::Display for ComparisonOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a verdict string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown comparison outcome '{0}'")]
pub struct ParseOutcomeError(pub String);

impl FromStr for ComparisonOutcome {
    type Err = ParseOutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prefer-new" | "new" | "1" => Ok(Self::PreferNew),
            "equal" | "draw" | "0.5" => Ok(Self::Equal),
            "prefer-existing" | "existing" | "0" => Ok(Self::PreferExisting),
            _ => Err(ParseOutcomeError(s.to_owned())),
        }
    }
}

/// One processed comparison, offered to the store's analytics log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparisonRecord {
    /// Item that was being ranked.
    pub new_item: ItemId,
    /// Collection item it was compared against.
    pub existing_item: ItemId,
    /// The user's verdict.
    pub outcome: ComparisonOutcome,
}
