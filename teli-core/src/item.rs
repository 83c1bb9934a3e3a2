//! Items held in a ranked collection.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Preference, Rating};

/// Opaque identifier for an item, typically a catalogue id.
pub type ItemId = u64;

/// Descriptive fields supplied by the catalogue or the user.
///
/// None of these influence rating maths; they travel with the item so
/// re-comparing keeps them intact.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ItemMetadata {
    /// Display title.
    pub title: Option<String>,
    /// Release year.
    pub year: Option<u16>,
    /// Poster image location.
    pub poster: Option<String>,
    /// Genre names.
    pub genres: Vec<String>,
    /// Free-form user tags.
    pub tags: Vec<String>,
    /// Private notes.
    pub notes: Option<String>,
}

impl ItemMetadata {
    /// Metadata with only a title.
    ///
    /// # Examples
    /// ```
    /// use teli_core::ItemMetadata;
    ///
    /// let metadata = ItemMetadata::titled("Heat").with_year(1995);
    /// assert_eq!(metadata.title.as_deref(), Some("Heat"));
    /// assert_eq!(metadata.year, Some(1995));
    /// ```
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Set the release year while returning `self` for chaining.
    #[must_use]
    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    /// Append a genre while returning `self` for chaining.
    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genres.push(genre.into());
        self
    }

    /// Append a user tag while returning `self` for chaining.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the private notes while returning `self` for chaining.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Fill every empty field from `fallback`.
    ///
    /// # Examples
    /// ```
    /// use teli_core::ItemMetadata;
    ///
    /// let watched = ItemMetadata::titled("Heat").with_year(1995).with_genre("Crime");
    /// let merged = ItemMetadata::default().with_year(1996).or_from(watched);
    /// assert_eq!(merged.title.as_deref(), Some("Heat"));
    /// assert_eq!(merged.year, Some(1996));
    /// assert_eq!(merged.genres, vec!["Crime".to_owned()]);
    /// ```
    #[must_use]
    pub fn or_from(self, fallback: Self) -> Self {
        Self {
            title: self.title.or(fallback.title),
            year: self.year.or(fallback.year),
            poster: self.poster.or(fallback.poster),
            genres: if self.genres.is_empty() {
                fallback.genres
            } else {
                self.genres
            },
            tags: if self.tags.is_empty() {
                fallback.tags
            } else {
                self.tags
            },
            notes: self.notes.or(fallback.notes),
        }
    }
}

/// Seconds since the Unix epoch, or `None` when the clock reads earlier.
#[must_use]
pub(crate) fn unix_timestamp() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|elapsed| elapsed.as_secs())
}

/// An item that has finished ranking and lives in the collection.
///
/// # Examples
/// ```
/// use teli_core::{Rating, RankedItem};
///
/// let item = RankedItem::new(7, Rating::new(1500));
/// assert_eq!(item.id, 7);
/// assert!(item.preference.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedItem {
    /// Item identifier.
    pub id: ItemId,
    /// Current rating.
    pub rating: Rating,
    /// First impression used when the item was last seeded.
    #[cfg_attr(feature = "serde", serde(default))]
    pub preference: Option<Preference>,
    /// Descriptive fields.
    #[cfg_attr(feature = "serde", serde(default))]
    pub metadata: ItemMetadata,
    /// When the item first entered the collection, in Unix seconds.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub added_at: Option<u64>,
}

impl RankedItem {
    /// Construct an item with no preference and empty metadata.
    #[must_use]
    pub fn new(id: ItemId, rating: Rating) -> Self {
        Self {
            id,
            rating,
            preference: None,
            metadata: ItemMetadata::default(),
            added_at: None,
        }
    }

    /// Record the seeding preference while returning `self` for chaining.
    #[must_use]
    pub fn with_preference(mut self, preference: Preference) -> Self {
        self.preference = Some(preference);
        self
    }

    /// Replace the metadata while returning `self` for chaining.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Record when the item was added while returning `self` for chaining.
    #[must_use]
    pub const fn with_added_at(mut self, added_at: u64) -> Self {
        self.added_at = Some(added_at);
        self
    }
}

/// An item about to enter the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    /// Item identifier.
    pub id: ItemId,
    /// Descriptive fields carried into the collection on commit.
    pub metadata: ItemMetadata,
}

impl Candidate {
    /// Construct a candidate with empty metadata.
    #[must_use]
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            metadata: ItemMetadata::default(),
        }
    }

    /// Replace the metadata while returning `self` for chaining.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl From<RankedItem> for Candidate {
    fn from(item: RankedItem) -> Self {
        Self {
            id: item.id,
            metadata: item.metadata,
        }
    }
}
