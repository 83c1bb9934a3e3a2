//! Pairwise rating model.
//!
//! Ratings live on an open integer scale. A [`RatingModel`] carries the
//! update sensitivity, the seed ratings and the lower bound; every operation
//! is a pure function of its inputs and the model value, so two models never
//! share hidden state.

use std::fmt;

use crate::{ComparisonOutcome, Preference};

/// Relative strength of an item within one rater's collection.
///
/// Only the order of ratings is meaningful; magnitudes cannot be compared
/// across collections.
///
/// # Examples
/// ```
/// use teli_core::Rating;
///
/// let rating = Rating::new(1500);
/// assert_eq!(rating.get(), 1500);
/// assert!(Rating::new(1600) > rating);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Rating(i64);

impl Rating {
    /// Wrap a raw rating value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Return the raw rating value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "ratings stay far below 2^52 in practice"
    )]
    pub(crate) const fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl From<i64> for Rating {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Probability that an item rated `rating_a` is preferred over one rated
/// `rating_b`.
///
/// Equal ratings yield exactly `0.5`; a 400-point lead yields roughly `0.909`.
///
/// # Examples
/// ```
/// use teli_core::{Rating, expected_outcome};
///
/// let p = expected_outcome(Rating::new(1500), Rating::new(1500));
/// assert_eq!(p, 0.5);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "the logistic curve is inherently floating-point"
)]
pub fn expected_outcome(rating_a: Rating, rating_b: Rating) -> f64 {
    let exponent = (rating_b.as_f64() - rating_a.as_f64()) / 400.0;
    1.0 / (1.0 + 10.0_f64.powf(exponent))
}

/// Round to the nearest integer, sending halves towards positive infinity.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    reason = "rounded rating deltas always fit in i64"
)]
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Tunable constants for rating updates and seeding.
///
/// # Examples
/// ```
/// use teli_core::{ComparisonOutcome, Rating, RatingModel};
///
/// let model = RatingModel::default();
/// let (new, existing) =
///     model.update_ratings(Rating::new(1600), Rating::new(1400), ComparisonOutcome::PreferNew);
/// assert!(new > existing);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingModel {
    /// Maximum rating movement from a single comparison.
    pub k_factor: f64,
    /// Seed for a neutral item entering an empty collection.
    pub base_rating: Rating,
    /// Lowest rating any update may produce.
    pub floor: Rating,
    /// Distance between a liked or disliked seed and the neutral seed.
    pub seed_offset: i64,
}

impl Default for RatingModel {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            base_rating: Rating::new(1500),
            floor: Rating::new(100),
            seed_offset: 100,
        }
    }
}

impl RatingModel {
    /// Apply one comparison verdict to a pair of ratings.
    ///
    /// `outcome` is expressed from the point of view of `rating_a`. Both
    /// sides move by `k_factor * (actual - expected)`, rounded. When the
    /// caller strictly preferred one side but the raw update leaves it
    /// below the other, both ratings are replaced by the rounded midpoint
    /// plus or minus one so the preferred side ends on top. An equal verdict
    /// never reorders. Results are clamped to [`RatingModel::floor`].
    ///
    /// # Examples
    /// ```
    /// use teli_core::{ComparisonOutcome, Rating, RatingModel};
    ///
    /// let model = RatingModel::default();
    /// let (a, b) =
    ///     model.update_ratings(Rating::new(1400), Rating::new(1600), ComparisonOutcome::PreferNew);
    /// assert_eq!((a.get(), b.get()), (1501, 1499));
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "rating deltas are computed in floating point before rounding"
    )]
    pub fn update_ratings(
        &self,
        rating_a: Rating,
        rating_b: Rating,
        outcome: ComparisonOutcome,
    ) -> (Rating, Rating) {
        let expected_a = expected_outcome(rating_a, rating_b);
        let expected_b = 1.0 - expected_a;
        let actual_a = outcome.score();
        let actual_b = 1.0 - actual_a;

        let raw_a = round_half_up(rating_a.as_f64() + self.k_factor * (actual_a - expected_a));
        let raw_b = round_half_up(rating_b.as_f64() + self.k_factor * (actual_b - expected_b));

        let (new_a, new_b) = match outcome {
            ComparisonOutcome::PreferNew if raw_a < raw_b => {
                let mid = midpoint(raw_a, raw_b);
                (mid.saturating_add(1), mid.saturating_sub(1))
            }
            ComparisonOutcome::PreferExisting if raw_a > raw_b => {
                let mid = midpoint(raw_a, raw_b);
                (mid.saturating_sub(1), mid.saturating_add(1))
            }
            _ => (raw_a, raw_b),
        };

        (self.clamp(new_a), self.clamp(new_b))
    }

    /// Seed rating for an item entering a collection.
    ///
    /// An empty collection seeds at `base_rating` shifted by `seed_offset`
    /// according to `preference`. Otherwise the seed is the mean of the
    /// existing ratings shifted the same way, rounded.
    ///
    /// # Examples
    /// ```
    /// use teli_core::{Preference, Rating, RatingModel};
    ///
    /// let model = RatingModel::default();
    /// assert_eq!(model.initial_rating(Preference::Liked, []).get(), 1600);
    ///
    /// let existing = [1600, 1400, 1500].map(Rating::new);
    /// assert_eq!(model.initial_rating(Preference::Disliked, existing).get(), 1400);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "the collection mean is a floating-point average"
    )]
    pub fn initial_rating<I>(&self, preference: Preference, existing: I) -> Rating
    where
        I: IntoIterator<Item = Rating>,
    {
        let (count, sum) = existing
            .into_iter()
            .fold((0_usize, 0_i128), |(count, sum), rating| {
                (count + 1, sum + i128::from(rating.get()))
            });
        let offset = self.preference_offset(preference);

        if count == 0 {
            return Rating::new(self.base_rating.get().saturating_add(offset));
        }

        let mean = sum as f64 / count as f64;
        Rating::new(round_half_up(mean + offset as f64))
    }

    const fn preference_offset(&self, preference: Preference) -> i64 {
        match preference {
            Preference::Liked => self.seed_offset,
            Preference::Fine => 0,
            Preference::Disliked => -self.seed_offset,
        }
    }

    fn clamp(&self, value: i64) -> Rating {
        Rating::new(value.max(self.floor.get()))
    }
}

/// Midpoint of two integers, rounding halves upwards.
const fn midpoint(a: i64, b: i64) -> i64 {
    a.saturating_add(b).saturating_add(1).div_euclid(2)
}
