//! Test-only, in-memory `CollectionStore` implementation used by unit and
//! behaviour tests.

use thiserror::Error;

use crate::{CollectionStore, ComparisonRecord, ItemId, RankedItem, Rating};

/// Store operation that [`MemoryStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// Fail `load_all`.
    Load,
    /// Fail `upsert_rating`.
    UpsertRating,
    /// Fail `append`.
    Append,
    /// Fail `remove`.
    Remove,
    /// Fail `record_comparison`.
    RecordComparison,
    /// Fail `remove_from_watchlist`.
    Watchlist,
}

/// Error returned by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryStoreError {
    /// A failure injected with [`MemoryStore::fail_on`].
    #[error("injected failure in {0:?}")]
    Injected(FailOn),
    /// The item is not in the collection.
    #[error("item {id} is not in the collection")]
    MissingItem {
        /// Identifier that was looked up.
        id: ItemId,
    },
}

/// In-memory `CollectionStore` implementation used in tests.
///
/// Items keep insertion order. A single operation may be configured to fail
/// to exercise error paths.
#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    items: Vec<RankedItem>,
    comparisons: Vec<ComparisonRecord>,
    watchlist: Vec<ItemId>,
    fail_on: Option<FailOn>,
}

impl MemoryStore {
    /// Create a store from a collection of items.
    #[must_use]
    pub fn with_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = RankedItem>,
    {
        Self {
            items: items.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Place `id` on the watchlist.
    pub fn watch(&mut self, id: ItemId) {
        if !self.watchlist.contains(&id) {
            self.watchlist.push(id);
        }
    }

    /// Current watchlist contents.
    #[must_use]
    pub fn watchlist(&self) -> &[ItemId] {
        &self.watchlist
    }

    /// Make every subsequent call to `operation` fail; `None` clears it.
    pub fn fail_on(&mut self, operation: Option<FailOn>) {
        self.fail_on = operation;
    }

    /// Look up an item by id.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&RankedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn check(&self, operation: FailOn) -> Result<(), MemoryStoreError> {
        if self.fail_on == Some(operation) {
            return Err(MemoryStoreError::Injected(operation));
        }
        Ok(())
    }
}

impl CollectionStore for MemoryStore {
    type Error = MemoryStoreError;

    fn load_all(&self) -> Result<Vec<RankedItem>, Self::Error> {
        self.check(FailOn::Load)?;
        Ok(self.items.clone())
    }

    fn upsert_rating(&mut self, id: ItemId, rating: Rating) -> Result<(), Self::Error> {
        self.check(FailOn::UpsertRating)?;
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(MemoryStoreError::MissingItem { id })?;
        item.rating = rating;
        Ok(())
    }

    fn append(&mut self, item: RankedItem) -> Result<(), Self::Error> {
        self.check(FailOn::Append)?;
        self.items.push(item);
        Ok(())
    }

    fn remove(&mut self, id: ItemId) -> Result<(), Self::Error> {
        self.check(FailOn::Remove)?;
        self.items.retain(|item| item.id != id);
        Ok(())
    }

    fn record_comparison(&mut self, record: &ComparisonRecord) -> Result<(), Self::Error> {
        self.check(FailOn::RecordComparison)?;
        self.comparisons.push(*record);
        Ok(())
    }

    fn comparisons(&self) -> Result<Vec<ComparisonRecord>, Self::Error> {
        Ok(self.comparisons.clone())
    }

    fn clear_comparisons(&mut self) -> Result<(), Self::Error> {
        self.comparisons.clear();
        Ok(())
    }

    /// Checks every injected failure before touching anything, so a failed
    /// replacement leaves the store unchanged.
    fn replace_all(
        &mut self,
        items: Vec<RankedItem>,
        comparisons: &[ComparisonRecord],
    ) -> Result<usize, Self::Error> {
        self.check(FailOn::Load)?;
        self.check(FailOn::Remove)?;
        self.check(FailOn::Append)?;
        self.check(FailOn::RecordComparison)?;
        let replaced = self.items.len();
        self.items = items;
        self.comparisons = comparisons.to_vec();
        Ok(replaced)
    }

    fn remove_from_watchlist(&mut self, id: ItemId) -> Result<bool, Self::Error> {
        self.check(FailOn::Watchlist)?;
        let before = self.watchlist.len();
        self.watchlist.retain(|watched| *watched != id);
        Ok(self.watchlist.len() != before)
    }
}
