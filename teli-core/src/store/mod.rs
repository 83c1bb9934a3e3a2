//! Persistence seam for ranked collections.
//!
//! The [`CollectionStore`] trait is the only way the ranking session touches
//! durable state. The store is authoritative: sessions read the collection
//! when they start and write every rating change straight back.

use crate::{ComparisonRecord, ItemId, RankedItem, Rating};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteCollectionStore, SqliteStoreError};

/// Read and write access to one rater's collection.
///
/// The optional hooks (`record_comparison`, `comparisons`,
/// `clear_comparisons` and `remove_from_watchlist`) default to no-ops so
/// minimal stores only need the four collection operations.
///
/// # Examples
///
/// ```rust
/// use std::convert::Infallible;
/// use teli_core::{CollectionStore, ItemId, RankedItem, Rating};
///
/// #[derive(Default)]
/// struct VecStore(Vec<RankedItem>);
///
/// impl CollectionStore for VecStore {
///     type Error = Infallible;
///
///     fn load_all(&self) -> Result<Vec<RankedItem>, Self::Error> {
///         Ok(self.0.clone())
///     }
///
///     fn upsert_rating(&mut self, id: ItemId, rating: Rating) -> Result<(), Self::Error> {
///         if let Some(item) = self.0.iter_mut().find(|item| item.id == id) {
///             item.rating = rating;
///         }
///         Ok(())
///     }
///
///     fn append(&mut self, item: RankedItem) -> Result<(), Self::Error> {
///         self.0.push(item);
///         Ok(())
///     }
///
///     fn remove(&mut self, id: ItemId) -> Result<(), Self::Error> {
///         self.0.retain(|item| item.id != id);
///         Ok(())
///     }
/// }
///
/// let mut store = VecStore::default();
/// store.append(RankedItem::new(1, Rating::new(1500))).unwrap();
/// assert_eq!(store.load_all().unwrap().len(), 1);
/// assert!(store.comparisons().unwrap().is_empty());
/// ```
pub trait CollectionStore {
    /// Error surfaced by the backing storage.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return every item in the collection.
    fn load_all(&self) -> Result<Vec<RankedItem>, Self::Error>;

    /// Overwrite the rating of an existing item.
    fn upsert_rating(&mut self, id: ItemId, rating: Rating) -> Result<(), Self::Error>;

    /// Add a newly ranked item to the collection.
    fn append(&mut self, item: RankedItem) -> Result<(), Self::Error>;

    /// Drop an item from the collection.
    fn remove(&mut self, id: ItemId) -> Result<(), Self::Error>;

    /// Log a processed comparison for later analysis.
    fn record_comparison(&mut self, record: &ComparisonRecord) -> Result<(), Self::Error> {
        let _ = record;
        Ok(())
    }

    /// Return the comparison log, oldest first.
    fn comparisons(&self) -> Result<Vec<ComparisonRecord>, Self::Error> {
        Ok(Vec::new())
    }

    /// Number of comparisons recorded so far.
    fn comparison_count(&self) -> Result<usize, Self::Error> {
        Ok(self.comparisons()?.len())
    }

    /// Empty the comparison log.
    fn clear_comparisons(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Swap the whole collection and comparison log for `items` and
    /// `comparisons`, returning how many items were replaced.
    ///
    /// The default runs one store call at a time and is not atomic: a
    /// failure part way leaves a partial collection. Stores that can stage
    /// writes should override it so a failure leaves everything as it was.
    fn replace_all(
        &mut self,
        items: Vec<RankedItem>,
        comparisons: &[ComparisonRecord],
    ) -> Result<usize, Self::Error> {
        let existing = self.load_all()?;
        for item in &existing {
            self.remove(item.id)?;
        }
        for item in items {
            self.append(item)?;
        }
        self.clear_comparisons()?;
        for record in comparisons {
            self.record_comparison(record)?;
        }
        Ok(existing.len())
    }

    /// Remove `id` from the watchlist, returning whether it was present.
    fn remove_from_watchlist(&mut self, id: ItemId) -> Result<bool, Self::Error> {
        let _ = id;
        Ok(false)
    }
}
