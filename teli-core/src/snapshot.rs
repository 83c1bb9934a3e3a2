//! Portable JSON snapshots of a collection.

use std::collections::HashSet;

use thiserror::Error;

use crate::{CollectionStore, ComparisonRecord, ItemId, RankedItem};

/// Format version written by [`CollectionSnapshot::capture`].
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Errors raised while decoding a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The payload was not valid snapshot JSON.
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    /// The payload was written by an incompatible version.
    #[error("unsupported snapshot version '{found}' (expected '{}')", SNAPSHOT_VERSION)]
    UnsupportedVersion {
        /// Version found in the payload.
        found: String,
    },
    /// The same item appears more than once.
    #[error("item {id} appears more than once in the snapshot")]
    DuplicateItem {
        /// Identifier of the repeated item.
        id: ItemId,
    },
}

/// Items and comparison log of one collection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CollectionSnapshot {
    /// Format version.
    pub version: String,
    /// Every item, in store order.
    pub items: Vec<RankedItem>,
    /// Comparison log, oldest first.
    #[serde(default)]
    pub comparisons: Vec<ComparisonRecord>,
}

/// What [`CollectionSnapshot::restore`] wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    /// Items removed from the store before restoring.
    pub replaced: usize,
    /// Items written.
    pub items: usize,
    /// Comparisons written to the log.
    pub comparisons: usize,
}

impl CollectionSnapshot {
    /// Read the whole collection and comparison log from `store`.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by the store.
    pub fn capture<S>(store: &S) -> Result<Self, S::Error>
    where
        S: CollectionStore + ?Sized,
    {
        Ok(Self {
            version: SNAPSHOT_VERSION.to_owned(),
            items: store.load_all()?,
            comparisons: store.comparisons()?,
        })
    }

    /// Serialise as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a snapshot, rejecting unknown versions and repeated items.
    ///
    /// # Examples
    /// ```
    /// use teli_core::{CollectionSnapshot, SnapshotError};
    ///
    /// let snapshot = CollectionSnapshot::from_json(
    ///     r#"{"version":"1.0","items":[{"id":1,"rating":1500}]}"#,
    /// )?;
    /// assert_eq!(snapshot.items[0].rating.get(), 1500);
    ///
    /// let err = CollectionSnapshot::from_json(r#"{"version":"2.0","items":[]}"#).unwrap_err();
    /// assert!(matches!(err, SnapshotError::UnsupportedVersion { .. }));
    /// # Ok::<(), SnapshotError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Parse`] for malformed JSON,
    /// [`SnapshotError::UnsupportedVersion`] for other versions and
    /// [`SnapshotError::DuplicateItem`] when an id repeats.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
            });
        }
        let mut seen = HashSet::with_capacity(snapshot.items.len());
        if let Some(repeated) = snapshot.items.iter().find(|item| !seen.insert(item.id)) {
            return Err(SnapshotError::DuplicateItem { id: repeated.id });
        }
        Ok(snapshot)
    }

    /// Replace the collection and comparison log in `store` with this
    /// snapshot's contents.
    ///
    /// The swap goes through [`CollectionStore::replace_all`], so it is
    /// atomic wherever the store's override is.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by the store.
    pub fn restore<S>(self, store: &mut S) -> Result<RestoreReport, S::Error>
    where
        S: CollectionStore + ?Sized,
    {
        let items = self.items.len();
        let comparisons = self.comparisons.len();
        let replaced = store.replace_all(self.items, &self.comparisons)?;
        log::debug!(
            "restored {items} item(s) and {comparisons} comparison(s) over {replaced} existing item(s)"
        );
        Ok(RestoreReport {
            replaced,
            items,
            comparisons,
        })
    }
}
