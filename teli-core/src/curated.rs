//! Themed shortlists drawn from a scored collection.
//!
//! Lists are rebuilt from [`project_scores`] on every call. A theme only
//! appears once it has enough members to be worth showing.

use crate::profile::{decade_of, newest_first};
use crate::{RankedItem, ScoredItem, project_scores};

/// Smallest collection, and smallest themed group, that yields a list.
pub const CURATED_MIN_ITEMS: usize = 3;
/// Collection size from which the overall top list is offered.
pub const TOP_RATED_MIN_ITEMS: usize = 5;
/// Items kept in each list.
pub const CURATED_LIST_LIMIT: usize = 10;
/// Tag that marks an item as worth watching again.
pub const REWATCHABLE_TAG: &str = "rewatchable";

const GENRE_LIST_LIMIT: usize = 5;
const DECADE_LIST_LIMIT: usize = 3;

/// What a curated list is about.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "kind", content = "value", rename_all = "kebab-case")
)]
pub enum CuratedTheme {
    /// Best items overall.
    TopRated,
    /// Best items of one genre.
    Genre(String),
    /// Best items of one decade, keyed by its first year.
    Decade(u16),
    /// Latest additions.
    RecentlyAdded,
    /// Items the user has tagged.
    Tagged,
    /// Items tagged [`REWATCHABLE_TAG`].
    Rewatchable,
}

impl CuratedTheme {
    /// Stable identifier such as `genre-science-fiction`.
    ///
    /// # Examples
    /// ```
    /// use teli_core::CuratedTheme;
    ///
    /// assert_eq!(CuratedTheme::Genre("Science Fiction".into()).slug(), "genre-science-fiction");
    /// assert_eq!(CuratedTheme::Decade(1990).slug(), "decade-1990");
    /// ```
    #[must_use]
    pub fn slug(&self) -> String {
        match self {
            Self::TopRated => "top-rated".to_owned(),
            Self::Genre(genre) => {
                let words: Vec<_> = genre.split_whitespace().collect();
                format!("genre-{}", words.join("-").to_lowercase())
            }
            Self::Decade(decade) => format!("decade-{decade}"),
            Self::RecentlyAdded => "recently-added".to_owned(),
            Self::Tagged => "tagged".to_owned(),
            Self::Rewatchable => REWATCHABLE_TAG.to_owned(),
        }
    }

    /// Heading shown above the list.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::TopRated => "Your Top Rated".to_owned(),
            Self::Genre(genre) => format!("Best {genre}"),
            Self::Decade(decade) => format!("Best of the {decade}s"),
            Self::RecentlyAdded => "Recently Added".to_owned(),
            Self::Tagged => "Your Tagged Items".to_owned(),
            Self::Rewatchable => "Rewatchable".to_owned(),
        }
    }
}

/// One themed shortlist.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CuratedList {
    /// What the list is about.
    pub theme: CuratedTheme,
    /// Members, at most [`CURATED_LIST_LIMIT`].
    pub items: Vec<ScoredItem>,
}

impl CuratedList {
    fn new<I>(theme: CuratedTheme, items: I) -> Self
    where
        I: IntoIterator<Item = ScoredItem>,
    {
        Self {
            theme,
            items: items.into_iter().take(CURATED_LIST_LIMIT).collect(),
        }
    }
}

/// Build the themed lists for a collection, in display order.
///
/// Collections smaller than [`CURATED_MIN_ITEMS`] produce no lists. Genre
/// lists favour the most common genres; decade lists run newest first.
/// Members of every list except "recently added" are ordered best first.
///
/// # Examples
/// ```
/// use teli_core::{CuratedTheme, ItemMetadata, RankedItem, Rating, curated_lists};
///
/// let items: Vec<_> = (1..=3)
///     .map(|id| {
///         RankedItem::new(id, Rating::new(1400 + 100 * i64::try_from(id).unwrap()))
///             .with_metadata(ItemMetadata::default().with_genre("Crime"))
///     })
///     .collect();
/// let lists = curated_lists(items);
/// assert_eq!(lists[0].theme, CuratedTheme::Genre("Crime".into()));
/// assert_eq!(lists[0].items[0].item.id, 3);
/// ```
#[must_use]
pub fn curated_lists(items: Vec<RankedItem>) -> Vec<CuratedList> {
    let scored = project_scores(items);
    if scored.len() < CURATED_MIN_ITEMS {
        return Vec::new();
    }

    let mut lists = Vec::new();
    if scored.len() >= TOP_RATED_MIN_ITEMS {
        lists.push(CuratedList::new(
            CuratedTheme::TopRated,
            scored.iter().cloned(),
        ));
    }

    let mut genres: Vec<(String, Vec<ScoredItem>)> = Vec::new();
    let mut decades: Vec<(u16, Vec<ScoredItem>)> = Vec::new();
    for entry in &scored {
        for genre in &entry.item.metadata.genres {
            group(&mut genres, genre, entry);
        }
        if let Some(year) = entry.item.metadata.year {
            group(&mut decades, &decade_of(year), entry);
        }
    }

    genres.retain(|(_, members)| members.len() >= CURATED_MIN_ITEMS);
    genres.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    lists.extend(
        genres
            .into_iter()
            .take(GENRE_LIST_LIMIT)
            .map(|(genre, members)| CuratedList::new(CuratedTheme::Genre(genre), members)),
    );

    decades.retain(|(_, members)| members.len() >= CURATED_MIN_ITEMS);
    decades.sort_by(|a, b| b.0.cmp(&a.0));
    lists.extend(
        decades
            .into_iter()
            .take(DECADE_LIST_LIMIT)
            .map(|(decade, members)| CuratedList::new(CuratedTheme::Decade(decade), members)),
    );

    lists.push(CuratedList::new(
        CuratedTheme::RecentlyAdded,
        newest_first(&scored, CURATED_LIST_LIMIT),
    ));

    let tagged: Vec<_> = scored
        .iter()
        .filter(|entry| !entry.item.metadata.tags.is_empty())
        .cloned()
        .collect();
    let rewatchable: Vec<_> = tagged
        .iter()
        .filter(|entry| entry.item.metadata.tags.iter().any(|tag| tag == REWATCHABLE_TAG))
        .cloned()
        .collect();
    if tagged.len() >= CURATED_MIN_ITEMS {
        lists.push(CuratedList::new(CuratedTheme::Tagged, tagged));
    }
    if rewatchable.len() >= CURATED_MIN_ITEMS {
        lists.push(CuratedList::new(CuratedTheme::Rewatchable, rewatchable));
    }

    log::debug!("built {} curated list(s) from {} item(s)", lists.len(), scored.len());
    lists
}

fn group<K>(groups: &mut Vec<(K, Vec<ScoredItem>)>, key: &K, entry: &ScoredItem)
where
    K: PartialEq + Clone,
{
    if let Some((_, members)) = groups.iter_mut().find(|(existing, _)| existing == key) {
        members.push(entry.clone());
    } else {
        groups.push((key.clone(), vec![entry.clone()]));
    }
}
