//! Aggregate views over a scored collection.
//!
//! Everything here is derived from [`project_scores`] and recomputed on
//! demand, so a profile is only as fresh as the collection it was built
//! from.

use crate::{CollectionStore, RankedItem, ScoreClass, ScoredItem, project_scores};

/// Genres reported in [`TasteProfile::genre_preferences`].
pub const GENRE_PREFERENCE_LIMIT: usize = 10;
/// Genres reported in [`TasteProfile::favourite_genres`].
pub const FAVOURITE_GENRE_LIMIT: usize = 3;
/// Items reported in [`TasteProfile::top_rated`].
pub const TOP_RATED_LIMIT: usize = 5;
/// Items reported in [`TasteProfile::recently_added`].
pub const RECENTLY_ADDED_LIMIT: usize = 5;
/// Genres reported by [`top_genres`] when used for display.
pub const TOP_GENRE_LIMIT: usize = 5;

/// Average score of the items tagged with one genre.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GenrePreference {
    /// Genre name.
    pub genre: String,
    /// Mean score, one decimal.
    pub average_score: f64,
    /// Number of items with this genre.
    pub count: usize,
}

/// Average score of the items released in one decade.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecadePreference {
    /// First year of the decade, e.g. `1990`.
    pub decade: u16,
    /// Mean score, one decimal.
    pub average_score: f64,
    /// Number of items from this decade.
    pub count: usize,
}

impl DecadePreference {
    /// Display label such as `1990s`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}s", self.decade)
    }
}

/// Number of items per [`ScoreClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScoreDistribution {
    /// Items scoring 8.5 or more.
    pub excellent: usize,
    /// Items scoring 7.0 up to 8.5.
    pub good: usize,
    /// Items scoring 5.5 up to 7.0.
    pub average: usize,
    /// Items scoring 4.0 up to 5.5.
    pub below_average: usize,
    /// Items scoring below 4.0.
    pub poor: usize,
}

impl ScoreDistribution {
    fn tally(&mut self, class: ScoreClass) {
        let slot = match class {
            ScoreClass::Excellent => &mut self.excellent,
            ScoreClass::Good => &mut self.good,
            ScoreClass::Average => &mut self.average,
            ScoreClass::BelowAverage => &mut self.below_average,
            ScoreClass::Poor => &mut self.poor,
        };
        *slot = slot.saturating_add(1);
    }

    /// Count for one class.
    #[must_use]
    pub const fn get(&self, class: ScoreClass) -> usize {
        match class {
            ScoreClass::Excellent => self.excellent,
            ScoreClass::Good => self.good,
            ScoreClass::Average => self.average,
            ScoreClass::BelowAverage => self.below_average,
            ScoreClass::Poor => self.poor,
        }
    }
}

/// Summary of what a rater tends to enjoy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TasteProfile {
    /// Highest-scoring genres, best first.
    pub genre_preferences: Vec<GenrePreference>,
    /// Names of the best-scoring genres.
    pub favourite_genres: Vec<String>,
    /// Per-decade averages, newest decade first.
    pub decade_preferences: Vec<DecadePreference>,
    /// Items per score class.
    pub distribution: ScoreDistribution,
    /// Mean score across the collection, one decimal.
    pub average_score: f64,
    /// Collection size.
    pub total_items: usize,
    /// Comparisons recorded so far.
    pub total_comparisons: usize,
    /// Best items, highest rating first.
    pub top_rated: Vec<ScoredItem>,
    /// Latest additions, newest first; items without a timestamp come last.
    pub recently_added: Vec<ScoredItem>,
}

impl TasteProfile {
    /// Build a profile from a collection, or `None` when it is empty.
    ///
    /// # Examples
    /// ```
    /// use teli_core::{ItemMetadata, RankedItem, Rating, TasteProfile};
    ///
    /// let items = vec![
    ///     RankedItem::new(1, Rating::new(1800))
    ///         .with_metadata(ItemMetadata::titled("Heat").with_year(1995).with_genre("Crime")),
    ///     RankedItem::new(2, Rating::new(1200))
    ///         .with_metadata(ItemMetadata::titled("Cats").with_year(2019).with_genre("Musical")),
    /// ];
    /// let profile = TasteProfile::from_items(items, 1).expect("non-empty");
    /// assert_eq!(profile.favourite_genres, vec!["Crime", "Musical"]);
    /// assert_eq!(profile.decade_preferences[0].label(), "2010s");
    /// assert!(TasteProfile::from_items(Vec::new(), 0).is_none());
    /// ```
    #[must_use]
    pub fn from_items(items: Vec<RankedItem>, total_comparisons: usize) -> Option<Self> {
        let scored = project_scores(items);
        if scored.is_empty() {
            return None;
        }

        let mut genres: Vec<(String, f64, usize)> = Vec::new();
        let mut decades: Vec<(u16, f64, usize)> = Vec::new();
        let mut distribution = ScoreDistribution::default();
        let mut total_score = 0.0;

        for entry in &scored {
            for genre in &entry.item.metadata.genres {
                accumulate(&mut genres, genre, entry.score);
            }
            if let Some(year) = entry.item.metadata.year {
                accumulate(&mut decades, &decade_of(year), entry.score);
            }
            distribution.tally(entry.class);
            total_score = add(total_score, entry.score);
        }

        let mut genre_preferences: Vec<GenrePreference> = genres
            .into_iter()
            .map(|(genre, sum, count)| GenrePreference {
                genre,
                average_score: mean_tenths(sum, count),
                count,
            })
            .collect();
        genre_preferences.sort_by(|a, b| b.average_score.total_cmp(&a.average_score));
        let favourite_genres = genre_preferences
            .iter()
            .take(FAVOURITE_GENRE_LIMIT)
            .map(|pref| pref.genre.clone())
            .collect();
        genre_preferences.truncate(GENRE_PREFERENCE_LIMIT);

        let mut decade_preferences: Vec<DecadePreference> = decades
            .into_iter()
            .map(|(decade, sum, count)| DecadePreference {
                decade,
                average_score: mean_tenths(sum, count),
                count,
            })
            .collect();
        decade_preferences.sort_by(|a, b| b.decade.cmp(&a.decade));

        let total_items = scored.len();
        let top_rated = scored.iter().take(TOP_RATED_LIMIT).cloned().collect();
        let recently_added = newest_first(&scored, RECENTLY_ADDED_LIMIT);

        Some(Self {
            genre_preferences,
            favourite_genres,
            decade_preferences,
            distribution,
            average_score: mean_tenths(total_score, total_items),
            total_items,
            total_comparisons,
            top_rated,
            recently_added,
        })
    }

    /// Build a profile from the collection and comparison log in `store`.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by the store.
    pub fn from_store<S>(store: &S) -> Result<Option<Self>, S::Error>
    where
        S: CollectionStore + ?Sized,
    {
        let items = store.load_all()?;
        let comparisons = store.comparison_count()?;
        Ok(Self::from_items(items, comparisons))
    }
}

/// Number of items tagged with one genre.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GenreCount {
    /// Genre name.
    pub genre: String,
    /// Number of items.
    pub count: usize,
}

/// Most common genres in `items`, most frequent first, at most `limit`.
///
/// Genres with equal counts keep the order in which they were first seen.
///
/// # Examples
/// ```
/// use teli_core::{ItemMetadata, RankedItem, Rating, top_genres};
///
/// let items = vec![
///     RankedItem::new(1, Rating::new(1500)).with_metadata(ItemMetadata::default().with_genre("Drama")),
///     RankedItem::new(2, Rating::new(1500)).with_metadata(
///         ItemMetadata::default().with_genre("Crime").with_genre("Drama"),
///     ),
/// ];
/// let top = top_genres(&items, 5);
/// assert_eq!(top[0].genre, "Drama");
/// assert_eq!(top[0].count, 2);
/// ```
#[must_use]
pub fn top_genres(items: &[RankedItem], limit: usize) -> Vec<GenreCount> {
    let mut counts: Vec<GenreCount> = Vec::new();
    for genre in items.iter().flat_map(|item| &item.metadata.genres) {
        if let Some(entry) = counts.iter_mut().find(|entry| entry.genre == *genre) {
            entry.count = entry.count.saturating_add(1);
        } else {
            counts.push(GenreCount {
                genre: genre.clone(),
                count: 1,
            });
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// The `limit` most recently added entries, newest first.
///
/// The sort is stable and places entries without `added_at` last, so they
/// keep their score order.
pub(crate) fn newest_first(scored: &[ScoredItem], limit: usize) -> Vec<ScoredItem> {
    let mut recent = scored.to_vec();
    recent.sort_by(|a, b| b.item.added_at.cmp(&a.item.added_at));
    recent.truncate(limit);
    recent
}

pub(crate) const fn decade_of(year: u16) -> u16 {
    year.div_euclid(10).saturating_mul(10)
}

fn accumulate<K>(groups: &mut Vec<(K, f64, usize)>, key: &K, score: f64)
where
    K: PartialEq + Clone,
{
    if let Some(group) = groups.iter_mut().find(|group| group.0 == *key) {
        group.1 = add(group.1, score);
        group.2 = group.2.saturating_add(1);
    } else {
        groups.push((key.clone(), score, 1));
    }
}

#[expect(clippy::float_arithmetic, reason = "scores are summed for averaging")]
const fn add(total: f64, score: f64) -> f64 {
    total + score
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "averages are displayed with one decimal"
)]
fn mean_tenths(sum: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    crate::rating::round_half_up(sum / count as f64 * 10.0) as f64 / 10.0
}
