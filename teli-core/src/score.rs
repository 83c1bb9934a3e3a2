//! Project raw ratings onto the 1–10 display scale.
//!
//! Scores are never stored. They are recomputed from the whole collection on
//! every read so they cannot drift from the ratings they describe.

use std::fmt;

use crate::{RankedItem, Rating};

/// Score reported when every item shares the same rating.
pub const SINGLE_ITEM_SCORE: f64 = 7.5;

/// Lowest display score.
pub const MIN_SCORE: f64 = 1.0;

/// Highest display score.
pub const MAX_SCORE: f64 = 10.0;

/// Map `rating` onto `[1.0, 10.0]` relative to the collection's bounds,
/// rounded to one decimal place.
///
/// Returns [`SINGLE_ITEM_SCORE`] when `min_rating == max_rating`.
///
/// # Examples
/// ```
/// use teli_core::{Rating, rating_to_score};
///
/// let (min, max) = (Rating::new(1200), Rating::new(1800));
/// assert_eq!(rating_to_score(Rating::new(1800), min, max), 10.0);
/// assert_eq!(rating_to_score(Rating::new(1500), min, max), 5.5);
/// assert_eq!(rating_to_score(Rating::new(1500), max, max), 7.5);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "normalising into the display range is a linear interpolation"
)]
pub fn rating_to_score(rating: Rating, min_rating: Rating, max_rating: Rating) -> f64 {
    if min_rating == max_rating {
        return SINGLE_ITEM_SCORE;
    }
    let span = max_rating.as_f64() - min_rating.as_f64();
    let normalised = (rating.as_f64() - min_rating.as_f64()) / span;
    round_tenths(MIN_SCORE + normalised * (MAX_SCORE - MIN_SCORE))
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "scores are displayed with one decimal"
)]
fn round_tenths(value: f64) -> f64 {
    crate::rating::round_half_up(value * 10.0) as f64 / 10.0
}

/// Display bucket for a score.
///
/// # Examples
/// ```
/// use teli_core::ScoreClass;
///
/// assert_eq!(ScoreClass::from_score(8.5), ScoreClass::Excellent);
/// assert_eq!(ScoreClass::from_score(3.9), ScoreClass::Poor);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ScoreClass {
    /// 8.5 and above.
    Excellent,
    /// 7.0 up to 8.5.
    Good,
    /// 5.5 up to 7.0.
    Average,
    /// 4.0 up to 5.5.
    BelowAverage,
    /// Below 4.0.
    Poor,
}

impl ScoreClass {
    /// Bucket a score. Each bucket includes its lower bound.
    #[must_use]
    pub const fn from_score(score: f64) -> Self {
        if score >= 8.5 {
            Self::Excellent
        } else if score >= 7.0 {
            Self::Good
        } else if score >= 5.5 {
            Self::Average
        } else if score >= 4.0 {
            Self::BelowAverage
        } else {
            Self::Poor
        }
    }

    /// Return the bucket tag as a kebab-case `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Average => "average",
            Self::BelowAverage => "below-average",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for ScoreClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item paired with its derived score.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScoredItem {
    /// The underlying collection item.
    pub item: RankedItem,
    /// Display score in `[1.0, 10.0]`.
    pub score: f64,
    /// Bucket for `score`.
    pub class: ScoreClass,
}

/// Lowest and highest rating in a collection, or `None` when it is empty.
#[must_use]
pub fn rating_bounds(items: &[RankedItem]) -> Option<(Rating, Rating)> {
    let mut ratings = items.iter().map(|item| item.rating);
    let first = ratings.next()?;
    Some(ratings.fold((first, first), |(low, high), rating| {
        (low.min(rating), high.max(rating))
    }))
}

/// Score every item against the collection's current bounds.
///
/// The result is ordered by rating, highest first; items with equal ratings
/// keep their input order.
///
/// # Examples
/// ```
/// use teli_core::{Rating, RankedItem, project_scores};
///
/// let items = vec![
///     RankedItem::new(1, Rating::new(1200)),
///     RankedItem::new(2, Rating::new(1800)),
/// ];
/// let scored = project_scores(items);
/// assert_eq!(scored[0].item.id, 2);
/// assert_eq!(scored[0].score, 10.0);
/// assert_eq!(scored[1].score, 1.0);
/// ```
#[must_use]
pub fn project_scores(mut items: Vec<RankedItem>) -> Vec<ScoredItem> {
    let Some((min_rating, max_rating)) = rating_bounds(&items) else {
        return Vec::new();
    };
    items.sort_by(|a, b| b.rating.cmp(&a.rating));
    items
        .into_iter()
        .map(|item| {
            let score = rating_to_score(item.rating, min_rating, max_rating);
            ScoredItem {
                item,
                score,
                class: ScoreClass::from_score(score),
            }
        })
        .collect()
}

/// Percentage confidence in an item's placement after `comparisons`
/// comparisons in a collection of `total_items`.
///
/// Full confidence needs roughly `3 * log2(total_items + 1)` comparisons.
///
/// # Examples
/// ```
/// use teli_core::confidence;
///
/// assert_eq!(confidence(0, 10), 0);
/// assert_eq!(confidence(3, 1), 100);
/// assert_eq!(confidence(50, 10), 100);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "confidence is a clamped percentage derived from a logarithm"
)]
pub fn confidence(comparisons: usize, total_items: usize) -> u8 {
    let ideal = (total_items as f64 + 1.0).log2() * 3.0;
    let percent = crate::rating::round_half_up(comparisons as f64 / ideal * 100.0);
    percent.clamp(0, 100) as u8
}
