//! Coarse first impressions used to seed a new item's rating.
//!
//! # Examples
//! ```
//! use teli_core::Preference;
//!
//! assert_eq!(Preference::Liked.as_str(), "liked");
//! assert_eq!(Preference::parse_lenient("meh"), Preference::Fine);
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The user's gut reaction before any pairwise comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Preference {
    /// Enjoyed it.
    Liked,
    /// Neither here nor there.
    #[default]
    Fine,
    /// Did not enjoy it.
    Disliked,
}

impl Preference {
    /// Return the preference as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Liked => "liked",
            Self::Fine => "fine",
            Self::Disliked => "disliked",
        }
    }

    /// Parse user input, falling back to [`Preference::Fine`] when the value
    /// is not recognised.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|err: ParsePreferenceError| {
            log::debug!("{err}; seeding as neutral");
            Self::Fine
        })
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a preference string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown preference '{0}'")]
pub struct ParsePreferenceError(pub String);

impl FromStr for Preference {
    type Err = ParsePreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "liked" | "like" => Ok(Self::Liked),
            "fine" | "neutral" => Ok(Self::Fine),
            "disliked" | "dislike" => Ok(Self::Disliked),
            _ => Err(ParsePreferenceError(s.to_owned())),
        }
    }
}
