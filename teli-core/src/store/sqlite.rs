//! SQLite-backed collection store.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use crate::{
    Candidate, ComparisonOutcome, ComparisonRecord, ItemId, ItemMetadata, ParseOutcomeError,
    ParsePreferenceError, Preference, RankedItem, Rating,
};

use super::CollectionStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS items (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id INTEGER NOT NULL UNIQUE,
        rating INTEGER NOT NULL,
        preference TEXT,
        metadata TEXT NOT NULL DEFAULT '{}',
        added_at INTEGER
    );
    CREATE TABLE IF NOT EXISTS comparisons (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        new_item INTEGER NOT NULL,
        existing_item INTEGER NOT NULL,
        outcome TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS watchlist (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id INTEGER NOT NULL UNIQUE,
        metadata TEXT NOT NULL DEFAULT '{}'
    );
";

/// Error raised when reading or writing the SQLite collection.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A statement failed.
    #[error("failed to {operation}: {source}")]
    Query {
        /// Operation being attempted.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The stored metadata payload was not valid JSON.
    #[error("failed to parse metadata for item {id}: {source}")]
    InvalidMetadata {
        /// Identifier of the item whose metadata failed to parse.
        id: ItemId,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Metadata could not be serialised.
    #[error("failed to encode metadata for item {id}: {source}")]
    EncodeMetadata {
        /// Identifier of the item being written.
        id: ItemId,
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The stored preference was not recognised.
    #[error("invalid preference stored for item {id}: {source}")]
    InvalidPreference {
        /// Identifier of the affected item.
        id: ItemId,
        /// Parse failure.
        #[source]
        source: ParsePreferenceError,
    },
    /// A logged comparison carried an unknown verdict.
    #[error("invalid comparison outcome in log: {0}")]
    InvalidOutcome(#[from] ParseOutcomeError),
    /// A rating update targeted an item that is not stored.
    #[error("item {id} is not in the collection")]
    MissingItem {
        /// Identifier that was looked up.
        id: ItemId,
    },
    /// An append targeted an item that is already stored.
    #[error("item {id} is already in the collection")]
    DuplicateItem {
        /// Identifier of the duplicate item.
        id: ItemId,
    },
}

fn query(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> SqliteStoreError {
    move |source| SqliteStoreError::Query { operation, source }
}

/// Read-write collection store persisted in a single SQLite database.
///
/// Items are returned in the order they were appended.
///
/// # Examples
///
/// ```
/// use teli_core::{CollectionStore, RankedItem, Rating, SqliteCollectionStore};
///
/// let mut store = SqliteCollectionStore::open_in_memory()?;
/// store.append(RankedItem::new(1, Rating::new(1500)))?;
/// store.upsert_rating(1, Rating::new(1520))?;
/// assert_eq!(store.load_all()?[0].rating.get(), 1520);
/// # Ok::<(), teli_core::SqliteStoreError>(())
/// ```
pub struct SqliteCollectionStore {
    connection: Connection,
}

impl fmt::Debug for SqliteCollectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCollectionStore")
            .field("path", &self.connection.path())
            .finish_non_exhaustive()
    }
}

impl SqliteCollectionStore {
    /// Open or create a collection database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::OpenDatabase`] when the file cannot be
    /// opened, or [`SqliteStoreError::Query`] when the schema cannot be
    /// created.
    pub fn open<P>(path: P) -> Result<Self, SqliteStoreError>
    where
        P: AsRef<Path>,
    {
        let database_path = path.as_ref();
        let connection =
            Connection::open(database_path).map_err(|source| SqliteStoreError::OpenDatabase {
                path: database_path.to_path_buf(),
                source,
            })?;
        Self::with_connection(connection)
    }

    /// Create a transient collection held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error when SQLite cannot allocate the database or create
    /// the schema.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteStoreError::OpenDatabase {
                path: PathBuf::from(":memory:"),
                source,
            })?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self, SqliteStoreError> {
        connection
            .execute_batch(SCHEMA)
            .map_err(query("create schema"))?;
        Ok(Self { connection })
    }

    /// Place `candidate` on the watchlist with its metadata, returning
    /// `false` if it was already there.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::EncodeMetadata`] when the metadata cannot
    /// be serialised, or [`SqliteStoreError::Query`] when the insert fails.
    pub fn add_to_watchlist(&mut self, candidate: &Candidate) -> Result<bool, SqliteStoreError> {
        let metadata = encode_metadata(candidate.id, &candidate.metadata)?;
        let inserted = self
            .connection
            .execute(
                "INSERT OR IGNORE INTO watchlist (id, metadata) VALUES (?1, ?2)",
                params![candidate.id, metadata],
            )
            .map_err(query("add to watchlist"))?;
        Ok(inserted > 0)
    }

    /// Watchlist contents, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Query`] when the read fails, or
    /// [`SqliteStoreError::InvalidMetadata`] when an entry is corrupt.
    pub fn watchlist(&self) -> Result<Vec<Candidate>, SqliteStoreError> {
        let mut statement = self
            .connection
            .prepare("SELECT id, metadata FROM watchlist ORDER BY seq")
            .map_err(query("read watchlist"))?;
        let rows = statement
            .query_map([], |row| {
                Ok((row.get::<_, ItemId>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(query("read watchlist"))?;
        let mut entries = Vec::new();
        for row in rows {
            let (id, metadata) = row.map_err(query("read watchlist"))?;
            entries.push(Candidate::new(id).with_metadata(decode_metadata(id, &metadata)?));
        }
        Ok(entries)
    }

    /// The watchlist entry for `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Query`] when the read fails, or
    /// [`SqliteStoreError::InvalidMetadata`] when the entry is corrupt.
    pub fn watchlist_entry(&self, id: ItemId) -> Result<Option<Candidate>, SqliteStoreError> {
        let metadata: Option<String> = self
            .connection
            .query_row(
                "SELECT metadata FROM watchlist WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(query("read watchlist"))?;
        metadata
            .map(|raw| Ok(Candidate::new(id).with_metadata(decode_metadata(id, &raw)?)))
            .transpose()
    }

    /// Overwrite the notes and tags of a ranked item, returning its updated
    /// metadata.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::MissingItem`] when `id` is not stored, or
    /// a metadata or query error when the row cannot be rewritten.
    pub fn update_notes(
        &mut self,
        id: ItemId,
        notes: Option<String>,
        tags: Vec<String>,
    ) -> Result<ItemMetadata, SqliteStoreError> {
        let stored: Option<String> = self
            .connection
            .query_row(
                "SELECT metadata FROM items WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(query("look up item"))?;
        let raw = stored.ok_or(SqliteStoreError::MissingItem { id })?;
        let metadata = ItemMetadata {
            notes,
            tags,
            ..decode_metadata(id, &raw)?
        };
        self.connection
            .execute(
                "UPDATE items SET metadata = ?1 WHERE id = ?2",
                params![encode_metadata(id, &metadata)?, id],
            )
            .map_err(query("update notes"))?;
        Ok(metadata)
    }
}

fn contains(connection: &Connection, id: ItemId) -> Result<bool, SqliteStoreError> {
    let found = connection
        .query_row("SELECT 1 FROM items WHERE id = ?1", params![id], |_| Ok(()))
        .optional()
        .map_err(query("look up item"))?;
    Ok(found.is_some())
}

fn insert_item(connection: &Connection, item: &RankedItem) -> Result<(), SqliteStoreError> {
    if contains(connection, item.id)? {
        return Err(SqliteStoreError::DuplicateItem { id: item.id });
    }
    connection
        .execute(
            "INSERT INTO items (id, rating, preference, metadata, added_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.id,
                item.rating.get(),
                item.preference.map(Preference::as_str),
                encode_metadata(item.id, &item.metadata)?,
                item.added_at
            ],
        )
        .map_err(query("append item"))?;
    Ok(())
}

fn insert_comparison(
    connection: &Connection,
    record: &ComparisonRecord,
) -> Result<(), SqliteStoreError> {
    connection
        .execute(
            "INSERT INTO comparisons (new_item, existing_item, outcome) VALUES (?1, ?2, ?3)",
            params![record.new_item, record.existing_item, record.outcome.as_str()],
        )
        .map_err(query("record comparison"))?;
    Ok(())
}

fn encode_metadata(id: ItemId, metadata: &ItemMetadata) -> Result<String, SqliteStoreError> {
    serde_json::to_string(metadata)
        .map_err(|source| SqliteStoreError::EncodeMetadata { id, source })
}

fn decode_metadata(id: ItemId, raw: &str) -> Result<ItemMetadata, SqliteStoreError> {
    serde_json::from_str(raw).map_err(|source| SqliteStoreError::InvalidMetadata { id, source })
}

struct StoredRow {
    id: ItemId,
    rating: i64,
    preference: Option<String>,
    metadata: String,
    added_at: Option<u64>,
}

fn decode_item(row: StoredRow) -> Result<RankedItem, SqliteStoreError> {
    let id = row.id;
    let preference = row
        .preference
        .map(|raw| raw.parse::<Preference>())
        .transpose()
        .map_err(|source| SqliteStoreError::InvalidPreference { id, source })?;
    Ok(RankedItem {
        id,
        rating: Rating::new(row.rating),
        preference,
        metadata: decode_metadata(id, &row.metadata)?,
        added_at: row.added_at,
    })
}

impl CollectionStore for SqliteCollectionStore {
    type Error = SqliteStoreError;

    fn load_all(&self) -> Result<Vec<RankedItem>, Self::Error> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT id, rating, preference, metadata, added_at FROM items ORDER BY seq",
            )
            .map_err(query("read items"))?;
        let mut rows = statement.query([]).map_err(query("read items"))?;
        let mut items = Vec::new();

        while let Some(row) = rows.next().map_err(query("read items"))? {
            let stored = StoredRow {
                id: row.get(0).map_err(query("read items"))?,
                rating: row.get(1).map_err(query("read items"))?,
                preference: row.get(2).map_err(query("read items"))?,
                metadata: row.get(3).map_err(query("read items"))?,
                added_at: row.get(4).map_err(query("read items"))?,
            };
            items.push(decode_item(stored)?);
        }

        Ok(items)
    }

    fn upsert_rating(&mut self, id: ItemId, rating: Rating) -> Result<(), Self::Error> {
        let updated = self
            .connection
            .execute(
                "UPDATE items SET rating = ?1 WHERE id = ?2",
                params![rating.get(), id],
            )
            .map_err(query("update rating"))?;
        if updated == 0 {
            return Err(SqliteStoreError::MissingItem { id });
        }
        Ok(())
    }

    fn append(&mut self, item: RankedItem) -> Result<(), Self::Error> {
        insert_item(&self.connection, &item)
    }

    fn remove(&mut self, id: ItemId) -> Result<(), Self::Error> {
        self.connection
            .execute("DELETE FROM items WHERE id = ?1", params![id])
            .map_err(query("remove item"))?;
        Ok(())
    }

    fn record_comparison(&mut self, record: &ComparisonRecord) -> Result<(), Self::Error> {
        insert_comparison(&self.connection, record)
    }

    fn comparisons(&self) -> Result<Vec<ComparisonRecord>, Self::Error> {
        let mut statement = self
            .connection
            .prepare("SELECT new_item, existing_item, outcome FROM comparisons ORDER BY seq")
            .map_err(query("read comparisons"))?;
        let mut rows = statement.query([]).map_err(query("read comparisons"))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next().map_err(query("read comparisons"))? {
            let new_item: ItemId = row.get(0).map_err(query("read comparisons"))?;
            let existing_item: ItemId = row.get(1).map_err(query("read comparisons"))?;
            let outcome: String = row.get(2).map_err(query("read comparisons"))?;
            records.push(ComparisonRecord {
                new_item,
                existing_item,
                outcome: outcome.parse::<ComparisonOutcome>()?,
            });
        }

        Ok(records)
    }

    fn comparison_count(&self) -> Result<usize, Self::Error> {
        self.connection
            .query_row("SELECT COUNT(*) FROM comparisons", [], |row| row.get(0))
            .map_err(query("count comparisons"))
    }

    fn clear_comparisons(&mut self) -> Result<(), Self::Error> {
        self.connection
            .execute("DELETE FROM comparisons", [])
            .map_err(query("clear comparisons"))?;
        Ok(())
    }

    /// Runs inside one transaction; any failure rolls every change back.
    fn replace_all(
        &mut self,
        items: Vec<RankedItem>,
        comparisons: &[ComparisonRecord],
    ) -> Result<usize, Self::Error> {
        let transaction = self
            .connection
            .transaction()
            .map_err(query("begin replacement"))?;
        let replaced = transaction
            .execute("DELETE FROM items", [])
            .map_err(query("clear items"))?;
        for item in &items {
            insert_item(&transaction, item)?;
        }
        transaction
            .execute("DELETE FROM comparisons", [])
            .map_err(query("clear comparisons"))?;
        for record in comparisons {
            insert_comparison(&transaction, record)?;
        }
        transaction
            .commit()
            .map_err(query("commit replacement"))?;
        Ok(replaced)
    }

    fn remove_from_watchlist(&mut self, id: ItemId) -> Result<bool, Self::Error> {
        let removed = self
            .connection
            .execute("DELETE FROM watchlist WHERE id = ?1", params![id])
            .map_err(query("remove from watchlist"))?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_db() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let db_path = dir.path().join("collection.db");
        (dir, db_path)
    }

    #[fixture]
    fn store() -> SqliteCollectionStore {
        SqliteCollectionStore::open_in_memory().expect("open in-memory store")
    }

    fn heat() -> RankedItem {
        RankedItem::new(949, Rating::new(1640))
            .with_preference(Preference::Liked)
            .with_metadata(
                ItemMetadata::titled("Heat")
                    .with_year(1995)
                    .with_genre("Crime"),
            )
            .with_added_at(1_761_000_000)
    }

    #[rstest]
    fn items_survive_reopening(#[from(temp_db)] (_dir, db_path): (TempDir, PathBuf)) {
        {
            let mut store = SqliteCollectionStore::open(&db_path).expect("open store");
            store.append(heat()).expect("append");
            store
                .append(RankedItem::new(2, Rating::new(1400)))
                .expect("append");
        }

        let reopened = SqliteCollectionStore::open(&db_path).expect("reopen store");
        let items = reopened.load_all().expect("load");
        assert_eq!(items, vec![heat(), RankedItem::new(2, Rating::new(1400))]);
    }

    #[rstest]
    fn upsert_of_missing_item_fails(mut store: SqliteCollectionStore) {
        let err = store
            .upsert_rating(5, Rating::new(1500))
            .expect_err("missing item");
        assert!(matches!(err, SqliteStoreError::MissingItem { id: 5 }));
    }

    #[rstest]
    fn duplicate_append_fails(mut store: SqliteCollectionStore) {
        store.append(heat()).expect("append");
        let err = store.append(heat()).expect_err("duplicate");
        assert!(matches!(err, SqliteStoreError::DuplicateItem { id: 949 }));
    }

    #[rstest]
    fn removed_item_can_be_reinserted(mut store: SqliteCollectionStore) {
        store.append(heat()).expect("append");
        store.remove(949).expect("remove");
        assert!(store.load_all().expect("load").is_empty());
        store.append(heat()).expect("append again");
        assert_eq!(store.load_all().expect("load").len(), 1);
    }

    #[rstest]
    fn comparison_log_keeps_order(mut store: SqliteCollectionStore) {
        let records = [
            ComparisonRecord {
                new_item: 3,
                existing_item: 1,
                outcome: ComparisonOutcome::PreferNew,
            },
            ComparisonRecord {
                new_item: 3,
                existing_item: 2,
                outcome: ComparisonOutcome::Equal,
            },
        ];
        for record in &records {
            store.record_comparison(record).expect("record");
        }
        assert_eq!(store.comparisons().expect("read log"), records.to_vec());
        assert_eq!(store.comparison_count().expect("count"), 2);
    }

    #[rstest]
    fn watchlist_add_and_remove(mut store: SqliteCollectionStore) {
        let alien = Candidate::new(7).with_metadata(ItemMetadata::titled("Alien").with_year(1979));
        assert!(store.add_to_watchlist(&alien).expect("add"));
        assert!(!store.add_to_watchlist(&Candidate::new(7)).expect("add again"));
        assert_eq!(store.watchlist().expect("read"), vec![alien.clone()]);
        assert_eq!(store.watchlist_entry(7).expect("entry"), Some(alien));
        assert!(store.remove_from_watchlist(7).expect("remove"));
        assert!(!store.remove_from_watchlist(7).expect("remove again"));
        assert_eq!(store.watchlist_entry(7).expect("entry"), None);
    }

    #[rstest]
    fn update_notes_keeps_other_metadata(mut store: SqliteCollectionStore) {
        store.append(heat()).expect("append");
        let updated = store
            .update_notes(949, Some("Diner scene".to_owned()), vec!["rewatchable".to_owned()])
            .expect("update");
        assert_eq!(updated.title.as_deref(), Some("Heat"));

        let stored = store.load_all().expect("load").remove(0);
        assert_eq!(stored.metadata.notes.as_deref(), Some("Diner scene"));
        assert_eq!(stored.metadata.tags, vec!["rewatchable".to_owned()]);
        assert_eq!(stored.metadata.year, Some(1995));
        assert_eq!(stored.rating, Rating::new(1640));
    }

    #[rstest]
    fn update_notes_of_missing_item_fails(mut store: SqliteCollectionStore) {
        let err = store
            .update_notes(3, None, Vec::new())
            .expect_err("missing item");
        assert!(matches!(err, SqliteStoreError::MissingItem { id: 3 }));
    }

    #[rstest]
    fn replace_all_swaps_items_and_log(mut store: SqliteCollectionStore) {
        store.append(heat()).expect("append");
        store
            .record_comparison(&ComparisonRecord {
                new_item: 949,
                existing_item: 1,
                outcome: ComparisonOutcome::Equal,
            })
            .expect("record");

        let replaced = store
            .replace_all(vec![RankedItem::new(5, Rating::new(1500))], &[])
            .expect("replace");

        assert_eq!(replaced, 1);
        assert_eq!(
            store.load_all().expect("load"),
            vec![RankedItem::new(5, Rating::new(1500))]
        );
        assert_eq!(store.comparison_count().expect("count"), 0);
    }

    #[rstest]
    fn failed_replace_all_rolls_back(mut store: SqliteCollectionStore) {
        store
            .append(RankedItem::new(1, Rating::new(1500)))
            .expect("append");
        store
            .append(RankedItem::new(2, Rating::new(1600)))
            .expect("append");
        let record = ComparisonRecord {
            new_item: 2,
            existing_item: 1,
            outcome: ComparisonOutcome::PreferNew,
        };
        store.record_comparison(&record).expect("record");

        let err = store
            .replace_all(
                vec![
                    RankedItem::new(9, Rating::new(1500)),
                    RankedItem::new(9, Rating::new(1400)),
                ],
                &[],
            )
            .expect_err("duplicate id");

        assert!(matches!(err, SqliteStoreError::DuplicateItem { id: 9 }));
        let ids: Vec<_> = store.load_all().expect("load").iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(store.comparisons().expect("log"), vec![record]);
    }

    #[rstest]
    fn invalid_metadata_is_reported(store: SqliteCollectionStore) {
        store
            .connection
            .execute(
                "INSERT INTO items (id, rating, metadata) VALUES (1, 1500, 'not-json')",
                [],
            )
            .expect("insert row");
        let err = store.load_all().expect_err("invalid metadata");
        assert!(matches!(err, SqliteStoreError::InvalidMetadata { id: 1, .. }));
    }

    #[rstest]
    fn invalid_preference_is_reported(store: SqliteCollectionStore) {
        store
            .connection
            .execute(
                "INSERT INTO items (id, rating, preference) VALUES (1, 1500, 'adored')",
                [],
            )
            .expect("insert row");
        let err = store.load_all().expect_err("invalid preference");
        assert!(matches!(
            err,
            SqliteStoreError::InvalidPreference { id: 1, .. }
        ));
    }

    #[rstest]
    fn open_reports_path_on_failure(#[from(temp_db)] (dir, _db_path): (TempDir, PathBuf)) {
        let bad = dir.path().join("missing").join("collection.db");
        let err = SqliteCollectionStore::open(&bad).expect_err("missing parent dir");
        assert!(matches!(err, SqliteStoreError::OpenDatabase { path, .. } if path == bad));
    }
}
